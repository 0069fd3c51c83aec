//! Configuration management for Elidune Desk

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    /// Directory receiving the rolling `system.log` audit file
    pub directory: PathBuf,
}

/// Loan rules applied by the circulation desk
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CirculationConfig {
    pub loan_duration_days: i64,
    pub renewal_days: i64,
    pub max_renewals: u32,
    /// Suspension days charged per overdue day
    pub suspension_factor: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub circulation: CirculationConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables.
    ///
    /// `config_file` replaces `config/default` when given on the command line.
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name(config_file.unwrap_or("config/default")).required(config_file.is_some()))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables (with prefix ELIDUNE_, e.g. ELIDUNE_STORAGE__DATA_DIR)
            .add_source(
                Environment::with_prefix("ELIDUNE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Configuration rooted at an explicit data directory, logs included
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            logging: LoggingConfig {
                directory: data_dir.join("logs"),
                ..LoggingConfig::default()
            },
            storage: StorageConfig { data_dir },
            circulation: CirculationConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: PathBuf::from("data/logs"),
        }
    }
}

impl Default for CirculationConfig {
    fn default() -> Self {
        Self {
            loan_duration_days: 14,
            renewal_days: 7,
            max_renewals: 2,
            suspension_factor: 3,
        }
    }
}
