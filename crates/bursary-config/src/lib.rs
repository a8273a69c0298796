//! # bursary-config
//!
//! Layered configuration loading for Bursary using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`BURSARY_*` prefix, `__` as separator)
//! 2. Project-level `.bursary/config.toml`
//! 3. User-level `~/.config/bursary/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `BURSARY_DATABASE__PATH` -> `database.path`,
//! `BURSARY_GENERAL__DEFAULT_TIMEZONE` -> `general.default_timezone`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use bursary_config::BursaryConfig;
//!
//! let config = BursaryConfig::load_with_dotenv().expect("config");
//! let tz = config.general.timezone().expect("valid timezone");
//! println!("database at {} ({tz})", config.database.path);
//! ```

mod database;
mod error;
mod general;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "BURSARY_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BursaryConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl BursaryConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read, a value has the wrong
    /// type, or the configured timezone is unknown.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Load with an explicit project config file instead of `.bursary/config.toml`.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(&figment)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".bursary/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and check cross-field constraints.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.general.timezone()?;
        if config.general.deadline_horizon_years == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.deadline_horizon_years".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(config)
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("bursary").join("config.toml"))
    }
}
