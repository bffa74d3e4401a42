//! Environment variable abstraction for testability.
//!
//! Production code uses [`Env::real()`] which delegates to [`std::env::var_os`].
//! Tests and embedding callers use [`Env::mock()`] backed by a `HashMap`,
//! so config-location lookups never need [`std::env::set_var`].

use std::collections::HashMap;
use std::ffi::OsString;

/// Environment variable reader.
///
/// Wraps lookups so that production code hits `std::env` while tests
/// can supply a controlled set of values.
#[derive(Clone, Debug)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Create an `Env` that reads from the real process environment.
    pub fn real() -> Self {
        Self { overrides: None }
    }

    /// Create an `Env` backed by explicit key-value pairs.
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            overrides: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// An `Env` with no variables at all.
    pub fn empty() -> Self {
        Self::mock(Vec::<(String, String)>::new())
    }

    /// Look up an environment variable by name.
    ///
    /// Values are returned as raw OS strings, so a path holding non-UTF-8
    /// bytes is still found.
    pub fn var_os(&self, name: &str) -> Option<OsString> {
        match &self.overrides {
            Some(map) => map.get(name).map(OsString::from),
            None => std::env::var_os(name),
        }
    }

    /// Returns the value only when the variable is set *and* non-empty.
    pub fn non_empty(&self, name: &str) -> Option<OsString> {
        self.var_os(name).filter(|v| !v.is_empty())
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::real()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_env_reads_cargo_manifest_dir() {
        let env = Env::real();
        assert!(env.var_os("CARGO_MANIFEST_DIR").is_some());
    }

    #[test]
    fn mock_env_returns_set_values() {
        let env = Env::mock([("FOO", "bar"), ("BAZ", "qux")]);
        assert_eq!(env.var_os("FOO"), Some(OsString::from("bar")));
        assert_eq!(env.var_os("BAZ"), Some(OsString::from("qux")));
    }

    #[test]
    fn mock_env_returns_none_for_missing() {
        let env = Env::empty();
        assert_eq!(env.var_os("NONEXISTENT"), None);
    }

    #[test]
    fn non_empty_skips_blank_values() {
        let env = Env::mock([("APP_CONFIG", "/etc/app.yaml"), ("BLANK", "")]);
        assert_eq!(env.non_empty("APP_CONFIG"), Some(OsString::from("/etc/app.yaml")));
        assert_eq!(env.non_empty("BLANK"), None);
        assert_eq!(env.non_empty("ABSENT"), None);
    }

    #[cfg(unix)]
    #[test]
    fn non_empty_keeps_non_utf8_values() {
        use std::os::unix::ffi::OsStrExt;

        let name = "LAYERCONF_TEST_NON_UTF8_PATH";
        let value = std::ffi::OsStr::from_bytes(b"/tmp/conf-\xff.yaml");
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var(name, value) };
        assert_eq!(Env::real().non_empty(name).as_deref(), Some(value));
        unsafe { std::env::remove_var(name) };
    }
}
