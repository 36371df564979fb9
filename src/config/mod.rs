//! # Configuration Management Module
//!
//! Configuration for the hunterlog binary, read from a TOML file.
//!
//! ## Configuration Structure
//!
//! - [`StorageConfig`] - Where the record store lives
//! - [`LoggingConfig`] - Log level and optional log file
//! - [`SecurityConfig`] - Argon2 tuning for password hashes
//! - [`TrackerConfig`] - Day rollover behaviour
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hunterlog::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("hunterlog.toml").await?;
//!     let config = Config::load("hunterlog.toml").await?;
//!     println!("Records live in {}", config.db_path().display());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "hunterlog.log"
//!
//! [security.argon2]
//! memory_kib = 19456
//! time_cost = 2
//! parallelism = 1
//!
//! [tracker]
//! daily_reset = true
//! ```
//!
//! Every section except `[storage]` may be omitted.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use argon2::Params;
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Name of the Sled database directory under `data_dir`.
pub const DB_DIR_NAME: &str = "hunterlog";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: Option<SecurityConfig>,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Argon2Config {
    #[serde(default)]
    pub memory_kib: Option<u32>,
    #[serde(default)]
    pub time_cost: Option<u32>,
    #[serde(default)]
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub argon2: Option<Argon2Config>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Run the streak reset at each local midnight while `watch` is running.
    #[serde(default = "default_daily_reset")]
    pub daily_reset: bool,
}

fn default_daily_reset() -> bool {
    true
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            daily_reset: default_daily_reset(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Location of the Sled record store.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir).join(DB_DIR_NAME)
    }

    /// Argon2 parameters from `[security.argon2]`, with library defaults for
    /// unset fields. `None` when the section is absent or the values are rejected.
    pub fn argon2_params(&self) -> Option<Params> {
        let tuning = self.security.as_ref()?.argon2.as_ref()?;
        let base = Params::DEFAULT;
        let mem = tuning.memory_kib.unwrap_or(base.m_cost());
        let time = tuning.time_cost.unwrap_or(base.t_cost());
        let para = tuning.parallelism.unwrap_or(base.p_cost());
        match Params::new(mem, time, para, None) {
            Ok(params) => Some(params),
            Err(e) => {
                log::warn!("Ignoring invalid argon2 settings: {}", e);
                None
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("hunterlog.log".to_string()),
            },
            security: Some(SecurityConfig {
                argon2: Some(Argon2Config::default()),
            }),
            tracker: TrackerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn default_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hunterlog.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let config = Config::load(path).await.unwrap();
        assert_eq!(config.storage.data_dir, "./data");
        assert_eq!(config.logging.file.as_deref(), Some("hunterlog.log"));
        assert!(config.tracker.daily_reset);
        assert_eq!(config.db_path(), PathBuf::from("./data").join("hunterlog"));
    }

    #[test]
    fn minimal_file_fills_defaults() {
        let config: Config = toml::from_str("[storage]\ndata_dir = \"/tmp/hunters\"\n").unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(config.security.is_none());
        assert!(config.tracker.daily_reset);
        assert!(config.argon2_params().is_none());
    }

    #[test]
    fn argon2_overrides_merge_with_defaults() {
        let config: Config = toml::from_str(
            "[storage]\ndata_dir = \"d\"\n[security.argon2]\ntime_cost = 3\n",
        )
        .unwrap();
        let params = config.argon2_params().unwrap();
        assert_eq!(params.t_cost(), 3);
        assert_eq!(params.m_cost(), Params::DEFAULT.m_cost());
    }

    #[test]
    fn rejected_argon2_values_fall_back() {
        let config: Config = toml::from_str(
            "[storage]\ndata_dir = \"d\"\n[security.argon2]\nparallelism = 0\n",
        )
        .unwrap();
        assert!(config.argon2_params().is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = tokio_test::block_on(Config::load("/nonexistent/hunterlog.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
