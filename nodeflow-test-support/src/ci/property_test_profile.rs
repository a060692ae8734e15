//! Property-test run profile shared by the nodeflow suites.
//!
//! CI raises case counts and may request forked execution through the
//! environment; local runs fall back to each suite's defaults.

use std::env;

/// Environment variable overriding the number of proptest cases.
pub const PROPTEST_CASES_ENV_KEY: &str = "PROPTEST_CASES";
/// Environment variable requesting forked proptest execution.
pub const NODEFLOW_PBT_FORK_ENV_KEY: &str = "NODEFLOW_PBT_FORK";

/// Case count and fork mode for one property suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Reads overrides from the environment, keeping the supplied defaults
    /// for unset or malformed values.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodeflow_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(32, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self {
            cases: override_or(PROPTEST_CASES_ENV_KEY, default_cases, parse_cases),
            fork: override_or(NODEFLOW_PBT_FORK_ENV_KEY, default_fork, parse_flag),
        }
    }

    /// Cases per property.
    #[must_use]
    pub fn cases(&self) -> u32 {
        self.cases
    }

    /// Whether each case runs in a forked process.
    #[must_use]
    pub fn fork(&self) -> bool {
        self.fork
    }
}

fn override_or<T>(key: &'static str, default: T, parse: fn(&str) -> Result<T, String>) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|reason| {
        tracing::warn!(
            env = key,
            raw = %raw,
            reason = %reason,
            "ignoring malformed property-test override",
        );
        default
    })
}

fn parse_cases(raw: &str) -> Result<u32, String> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err("case count must be positive".to_owned()),
        Ok(cases) => Ok(cases),
        Err(error) => Err(format!("not a case count: {error}")),
    }
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("`{other}` is not a boolean flag")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};

    use rstest::{fixture, rstest};

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Holds the environment lock and restores both keys on drop.
    struct ScopedEnv {
        saved: Vec<(&'static str, Option<String>)>,
        _lock: MutexGuard<'static, ()>,
    }

    impl ScopedEnv {
        fn apply(&mut self, key: &'static str, value: Option<&str>) {
            self.saved.push((key, env::var(key).ok()));
            // SAFETY: every test touching these keys holds ENV_LOCK.
            unsafe {
                match value {
                    Some(value) => env::set_var(key, value),
                    None => env::remove_var(key),
                }
            }
        }
    }

    impl Drop for ScopedEnv {
        fn drop(&mut self) {
            for (key, original) in self.saved.drain(..).rev() {
                // SAFETY: the lock is still held until `_lock` drops.
                unsafe {
                    match original {
                        Some(value) => env::set_var(key, value),
                        None => env::remove_var(key),
                    }
                }
            }
        }
    }

    #[fixture]
    fn scoped_env() -> ScopedEnv {
        let lock = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut scoped = ScopedEnv {
            saved: Vec::new(),
            _lock: lock,
        };
        scoped.apply(PROPTEST_CASES_ENV_KEY, None);
        scoped.apply(NODEFLOW_PBT_FORK_ENV_KEY, None);
        scoped
    }

    #[rstest]
    fn defaults_apply_without_overrides(scoped_env: ScopedEnv) {
        let profile = ProptestRunProfile::load(48, true);
        assert_eq!(profile, ProptestRunProfile { cases: 48, fork: true });
        drop(scoped_env);
    }

    #[rstest]
    #[case::one("1", 1)]
    #[case::padded(" 512 ", 512)]
    #[case::large("20000", 20_000)]
    fn case_override_is_used(mut scoped_env: ScopedEnv, #[case] raw: &str, #[case] expected: u32) {
        scoped_env.apply(PROPTEST_CASES_ENV_KEY, Some(raw));
        assert_eq!(ProptestRunProfile::load(48, false).cases(), expected);
    }

    #[rstest]
    #[case::zero("0")]
    #[case::negative("-4")]
    #[case::text("many")]
    fn malformed_case_override_keeps_default(mut scoped_env: ScopedEnv, #[case] raw: &str) {
        scoped_env.apply(PROPTEST_CASES_ENV_KEY, Some(raw));
        assert_eq!(ProptestRunProfile::load(48, false).cases(), 48);
    }

    #[rstest]
    #[case::truthy("yes", true)]
    #[case::upper("ON", true)]
    #[case::digit("0", false)]
    #[case::falsy("False", false)]
    fn fork_override_is_used(mut scoped_env: ScopedEnv, #[case] raw: &str, #[case] expected: bool) {
        scoped_env.apply(NODEFLOW_PBT_FORK_ENV_KEY, Some(raw));
        assert_eq!(ProptestRunProfile::load(48, !expected).fork(), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::two("2")]
    #[case::unsure("maybe")]
    fn malformed_fork_override_keeps_default(mut scoped_env: ScopedEnv, #[case] raw: &str) {
        scoped_env.apply(NODEFLOW_PBT_FORK_ENV_KEY, Some(raw));
        assert!(ProptestRunProfile::load(48, true).fork());
    }
}
