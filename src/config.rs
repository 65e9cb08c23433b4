//! File locations for the manager. Defaults sit in the working directory; the environment
//! can point either file elsewhere.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_DATA_PATH: &str = "purchasing_power.csv";
pub const DEFAULT_DELETED_PATH: &str = "deleted_info.csv";

pub const DATA_PATH_ENV: &str = "PPP_DATA_FILE";
pub const DELETED_PATH_ENV: &str = "PPP_DELETED_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    pub data_path: PathBuf,
    pub deleted_path: PathBuf,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            deleted_path: PathBuf::from(DEFAULT_DELETED_PATH),
        }
    }
}

impl ManagerConfig {
    pub fn new(data_path: impl Into<PathBuf>, deleted_path: impl Into<PathBuf>) -> Self {
        ManagerConfig {
            data_path: data_path.into(),
            deleted_path: deleted_path.into(),
        }
    }

    /// Defaults overridden by `PPP_DATA_FILE` / `PPP_DELETED_FILE` when set and non-empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };
        ManagerConfig {
            data_path: pick(DATA_PATH_ENV, DEFAULT_DATA_PATH),
            deleted_path: pick(DELETED_PATH_ENV, DEFAULT_DELETED_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn from_lookup_uses_defaults_when_unset_or_blank() {
        let vars: HashMap<&str, &str> = HashMap::from([(DELETED_PATH_ENV, "  ")]);
        let config = ManagerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config, ManagerConfig::default());
    }

    #[test]
    fn from_lookup_applies_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(DATA_PATH_ENV, "/tmp/ppp.csv"), (DELETED_PATH_ENV, "gone.csv")]);
        let config = ManagerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config, ManagerConfig::new("/tmp/ppp.csv", "gone.csv"));
    }
}
