//! Environment variable access for connection resolution.
//!
//! Resolution never reads `std::env` directly. It goes through the
//! [`EnvSource`] trait so tests can supply a fixed snapshot without
//! mutating the real process environment.

use std::collections::BTreeMap;

/// Read-only key-value source consulted during parameter resolution.
///
/// A variable set to the empty string is indistinguishable from an
/// unset variable: both fall through to the next resolution tier.
pub trait EnvSource {
    /// Return the raw value for `key`, if the key is present at all.
    fn raw(&self, key: &str) -> Option<String>;

    /// Return the value for `key`, treating empty values as absent.
    fn get(&self, key: &str) -> Option<String> {
        self.raw(key).filter(|value| !value.is_empty())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn raw(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory environment snapshot, primarily for tests.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, returning self for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Set a variable in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }
}

impl EnvSource for MapEnv {
    fn raw(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_env_lookup() {
        let env = MapEnv::new().with("DB_USER", "alice");
        assert_eq!(env.get("DB_USER"), Some("alice".to_string()));
        assert_eq!(env.get("DB_PWD"), None);
    }

    #[test]
    fn test_empty_value_is_absent() {
        let env = MapEnv::new().with("DB_SERVER", "");
        assert_eq!(env.raw("DB_SERVER"), Some(String::new()));
        assert_eq!(env.get("DB_SERVER"), None);
    }

    #[test]
    fn test_from_iterator() {
        let env: MapEnv = [("DB", "sales"), ("DB_PORT", "5432")].into_iter().collect();
        assert_eq!(env.get("DB"), Some("sales".to_string()));
        assert_eq!(env.get("DB_PORT"), Some("5432".to_string()));
    }
}
