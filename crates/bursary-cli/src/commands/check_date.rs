use anyhow::Context;
use chrono::Utc;
use chrono_tz::Tz;
use serde::Serialize;

use bursary_config::BursaryConfig;
use bursary_core::validation::{DateBounds, validate_bounded_datetime, validate_datetime};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CheckDateArgs;
use crate::output::output;

#[derive(Debug, Serialize, PartialEq, Eq)]
struct DateCheck {
    input: String,
    timezone: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    utc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn check(raw: &str, tz: Tz, bounds: Option<DateBounds>) -> DateCheck {
    let result = match bounds {
        Some(bounds) => validate_bounded_datetime(raw, Utc::now(), tz, bounds),
        None => validate_datetime(raw, tz),
    };
    let horizon = bounds.unwrap_or_default().horizon_years;
    let (utc, error, message) = match result {
        Ok(instant) => (Some(instant.to_rfc3339()), None, None),
        Err(kind) => (None, Some(kind.as_str()), Some(kind.message(horizon))),
    };
    DateCheck {
        input: raw.to_string(),
        timezone: tz.name().to_string(),
        valid: utc.is_some(),
        utc,
        error,
        message,
    }
}

/// Handle `bursary check-date`. Needs no database.
pub fn handle(args: &CheckDateArgs, config: &BursaryConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let tz = match &args.tz {
        Some(name) => name
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid --tz '{name}'"))?,
        None => config.general.timezone()?,
    };
    let bounds = args.bounded.then_some(DateBounds {
        horizon_years: config.general.deadline_horizon_years,
    });
    output(&check(&args.raw, tz, bounds), flags.format)
}
