//! Service configuration.
//!
//! # Responsibility
//! - Describe every tunable of the service in one explicit value.
//! - Load that value from a JSON file with per-field defaults.
//!
//! # Invariants
//! - Configuration is passed to `UserService::new`; core code reads no
//!   process-wide settings.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Runtime configuration for the user service and its caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
    /// Flat file preloaded at startup and used as the default export target.
    pub data_file: Option<PathBuf>,
    /// Upper bound for acquiring the store lock.
    pub lock_timeout_ms: u64,
    /// Pretty-print exported JSON.
    pub export_pretty: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            data_file: None,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            export_pretty: true,
        }
    }
}

impl ServiceConfig {
    /// Reads and validates a JSON config file. Missing keys take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "lock_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    field: "log_dir",
                    reason: format!("must be an absolute path, got `{}`", dir.display()),
                });
            }
        }
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "warning" | "error" => Ok(()),
            other => Err(ConfigError::Invalid {
                field: "log_level",
                reason: format!("unsupported level `{other}`"),
            }),
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServiceConfig};
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn missing_keys_take_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"data_file": "data/users.json"}}"#).unwrap();

        let config = ServiceConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.lock_timeout(), Duration::from_secs(5));
        assert!(config.export_pretty);
        assert_eq!(
            config.data_file.as_deref(),
            Some(std::path::Path::new("data/users.json"))
        );
    }

    #[test]
    fn rejects_zero_lock_timeout() {
        let config = ServiceConfig {
            lock_timeout_ms: 0,
            ..ServiceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "lock_timeout_ms",
                ..
            })
        ));
    }

    #[test]
    fn rejects_unknown_keys_and_relative_log_dir() {
        let mut unknown = tempfile::NamedTempFile::new().unwrap();
        write!(unknown, r#"{{"log_levle": "info"}}"#).unwrap();
        assert!(matches!(
            ServiceConfig::from_json_file(unknown.path()),
            Err(ConfigError::Parse { .. })
        ));

        let relative = ServiceConfig {
            log_dir: Some("logs".into()),
            ..ServiceConfig::default()
        };
        assert!(matches!(
            relative.validate(),
            Err(ConfigError::Invalid { field: "log_dir", .. })
        ));
    }
}
