//! Configuration models for apexbatch.
//!
//! All I^R (resolvable ignorance) is parameterized here.
//! The user resolves these unknowns at runtime via config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for apexbatch.
///
/// I^R resolved: All configurable parameters are explicit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage layout configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Executor configuration
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Storage layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for scripts, results, checkpoints, and job metadata
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".apexbatch")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

/// Executor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Number of concurrent workers (non-positive falls back to 5 at run time)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Name or path of the Salesforce CLI binary
    #[serde(default = "default_sf_bin")]
    pub sf_bin: String,
}

fn default_concurrency() -> usize {
    5
}

fn default_sf_bin() -> String {
    "sf".to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            sf_bin: default_sf_bin(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// B_i(file exists) → Result
    /// B_i(file is valid TOML) → Result
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.executor.concurrency, 5);
        assert_eq!(config.executor.sf_bin, "sf");
        assert_eq!(config.storage.base_dir, PathBuf::from(".apexbatch"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [executor]
            concurrency = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.executor.concurrency, 12);
        assert_eq!(config.executor.sf_bin, "sf");
    }
}
