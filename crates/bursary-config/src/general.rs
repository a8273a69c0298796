//! Pipeline behavior settings.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_timezone() -> String {
    "UTC".into()
}

const fn default_horizon_years() -> u32 {
    5
}

/// Default result limit.
const fn default_limit() -> u32 {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// IANA zone naive form date/times are interpreted in.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// How far ahead a bounded date (e.g. an application deadline) may lie.
    #[serde(default = "default_horizon_years")]
    pub deadline_horizon_years: u32,

    /// Write a `validation_error` audit record when a submission is rejected.
    #[serde(default)]
    pub audit_validation_failures: bool,

    /// Default result limit for list commands.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            deadline_horizon_years: default_horizon_years(),
            audit_validation_failures: false,
            default_limit: default_limit(),
        }
    }
}

impl GeneralConfig {
    /// Parse `default_timezone`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for names outside the IANA database.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.default_timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "general.default_timezone".into(),
                reason: e.to_string(),
            })
    }
}
