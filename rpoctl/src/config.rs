//! Application configuration management.
//!
//! Configuration is layered from default values, an optional TOML file and
//! environment variables, in increasing order of precedence.

use crate::{CliError, schedule::Scheduler};
use rpo_core::models::EngineConfig;
use rpo_sqlite::config::SqliteConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The main application configuration that composes all component configs
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Warehouse location
    #[serde(default)]
    pub database: SqliteConfig,

    /// Thresholds, price ranges and solver settings of the engine
    #[serde(default)]
    pub engine: EngineConfig,

    /// Optional repetition of the `run` command
    #[serde(default)]
    pub schedule: Scheduler,
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. The config file, if given
    /// 3. Default values (lowest priority)
    ///
    /// Environment variables are mapped using the pattern
    /// `APP_<SECTION>__<KEY>` to `<section>.<key>`:
    ///
    /// ```bash
    /// export APP_DATABASE__DATABASE_PATH="/data/warehouse.db"
    /// export APP_ENGINE__MIN_MARGIN="0.05"
    /// export APP_SCHEDULE__EVERY="1day"
    /// ```
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(CliError::MissingConfig(path.to_path_buf()).into());
            }
            config = config.add_source(config::File::from(path));
        }

        config = config.add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let app: Self = config.build()?.try_deserialize()?;
        app.engine.validate()?;
        if app.schedule.every.is_some_and(|every| every.is_zero()) {
            return Err(CliError::ZeroInterval.into());
        }
        Ok(app)
    }
}
