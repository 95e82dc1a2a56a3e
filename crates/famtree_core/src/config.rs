//! Runtime configuration resolved from environment variables.
//!
//! | Variable            | Default                          |
//! |---------------------|----------------------------------|
//! | `FAMTREE_DB_PATH`   | `<temp_dir>/famtree.sqlite3`     |
//! | `FAMTREE_LOG_LEVEL` | `default_log_level()`            |
//! | `FAMTREE_LOG_DIR`   | unset (file logging disabled)    |

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "FAMTREE_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "FAMTREE_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "FAMTREE_LOG_DIR";
pub const DEFAULT_DB_FILE_NAME: &str = "famtree.sqlite3";

/// Process configuration shared by the CLI and FFI entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file backing the key-value store.
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logs.
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: read(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            log_level: read(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}

pub fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::{default_db_path, CoreConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let vars = HashMap::from([(DB_PATH_ENV, "   ")]);
        let config = CoreConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.db_path, default_db_path());
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let vars = HashMap::from([
            (DB_PATH_ENV, "/data/tree.sqlite3"),
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "/var/log/famtree"),
        ]);
        let config = CoreConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.db_path, PathBuf::from("/data/tree.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/famtree")));
    }
}
