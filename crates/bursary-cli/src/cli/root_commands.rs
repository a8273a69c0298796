use clap::{Args, Subcommand};

use bursary_core::enums::{EntityKind, MutationAction};

use crate::cli::subcommands::NotificationCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create, update, or delete an entity through the full pipeline.
    Mutate(MutateArgs),
    /// Query the audit trail.
    Audit(AuditArgs),
    /// Notification inbox.
    Notifications {
        #[command(subcommand)]
        action: NotificationCommands,
    },
    /// Validate a date/time string the way form fields do.
    #[command(name = "check-date")]
    CheckDate(CheckDateArgs),
}

/// Parse a `key=value` form field.
fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[derive(Clone, Debug, Args)]
pub struct MutateArgs {
    /// create, update, or delete
    pub action: MutationAction,
    /// stipend, tag, organization, user, or bot
    pub entity: EntityKind,
    /// Form field as key=value; update and delete need id=<n>
    #[arg(short = 'f', long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
    /// Acting user id (0 or absent means the system)
    #[arg(long)]
    pub actor: Option<i64>,
    /// Resolve the response as a partial-page fragment
    #[arg(long)]
    pub fragment: bool,
    /// Client address recorded in the audit trail
    #[arg(long)]
    pub ip: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// Object type (e.g. tag)
    #[arg(long)]
    pub entity: Option<String>,
    #[arg(long)]
    pub id: Option<i64>,
    /// create, update, delete, error, validation_error
    #[arg(long)]
    pub action: Option<String>,
    #[arg(long)]
    pub actor: Option<i64>,
    /// Max records (defaults to `[general] default_limit`)
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Clone, Debug, Args)]
pub struct CheckDateArgs {
    /// Date/time in YYYY-MM-DD HH:MM:SS
    pub raw: String,
    /// IANA timezone (defaults to `[general] default_timezone`)
    #[arg(long)]
    pub tz: Option<String>,
    /// Apply the past/future deadline limits
    #[arg(long)]
    pub bounded: bool,
}
