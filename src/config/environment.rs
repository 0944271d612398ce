//! Runtime environment selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Primary variable naming the environment.
pub const HANAMI_ENV: &str = "HANAMI_ENV";

/// Fallback variable, consulted when `HANAMI_ENV` is unset.
pub const RACK_ENV: &str = "RACK_ENV";

/// The environment an application boots in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
    /// Any other name, e.g. `staging`.
    Other(String),
}

impl Environment {
    /// Detect the environment from `HANAMI_ENV`, then `RACK_ENV`.
    pub fn detect() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Detect using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        [HANAMI_ENV, RACK_ENV]
            .iter()
            .filter_map(|key| lookup(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .map(|value| Self::from(value.as_str()))
    }

    pub fn name(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
            Environment::Other(name) => name,
        }
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Environment::Test)
    }
}

impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "production" | "prod" => Environment::Production,
            other => Environment::Other(other.to_string()),
        }
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Environment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from(name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_hanami_env_wins_over_rack_env() {
        let env = Environment::from_lookup(lookup(&[("HANAMI_ENV", "test"), ("RACK_ENV", "production")]));
        assert_eq!(env, Some(Environment::Test));
    }

    #[test]
    fn test_rack_env_fallback() {
        let env = Environment::from_lookup(lookup(&[("RACK_ENV", "production")]));
        assert_eq!(env, Some(Environment::Production));

        let env = Environment::from_lookup(lookup(&[("HANAMI_ENV", "  "), ("RACK_ENV", "staging")]));
        assert_eq!(env, Some(Environment::Other("staging".into())));
    }

    #[test]
    fn test_unset_is_none() {
        assert_eq!(Environment::from_lookup(lookup(&[])), None);
    }

    #[test]
    fn test_names_round_trip() {
        assert_eq!(Environment::from("PROD").name(), "production");
        assert!(Environment::from("test").is_test());
        assert_eq!(Environment::Other("qa".into()).to_string(), "qa");
    }
}
