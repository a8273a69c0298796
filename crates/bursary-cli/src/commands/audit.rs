use bursary_core::entities::AuditRecord;
use bursary_core::enums::AuditAction;
use bursary_db::repos::audit::AuditFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `bursary audit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let records = fetch(args, ctx).await?;
    output(&records, flags.format)
}

async fn fetch(args: &AuditArgs, ctx: &AppContext) -> anyhow::Result<Vec<AuditRecord>> {
    let filter = audit_filter(args, ctx.config.general.default_limit)?;
    ctx.service.query_audit(&filter).await.map_err(Into::into)
}

/// Build the repository filter; `--limit` falls back to the configured default.
fn audit_filter(args: &AuditArgs, default_limit: u32) -> anyhow::Result<AuditFilter> {
    Ok(AuditFilter {
        object_type: args.entity.clone(),
        object_id: args.id,
        action: args
            .action
            .as_deref()
            .map(|value| parse_enum::<AuditAction>(value, "action"))
            .transpose()?,
        user_id: args.actor,
        limit: Some(args.limit.unwrap_or(default_limit)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> AuditArgs {
        AuditArgs {
            entity: Some("stipend".into()),
            id: None,
            action: Some("validation-error".into()),
            actor: Some(7),
            limit: None,
        }
    }

    #[test]
    fn limit_falls_back_to_config_default() {
        let filter = audit_filter(&args(), 50).unwrap();
        assert_eq!(filter.limit, Some(50));
        assert_eq!(filter.action, Some(AuditAction::ValidationError));
        assert_eq!(filter.user_id, Some(7));
    }

    #[test]
    fn explicit_limit_wins() {
        let filter = audit_filter(&AuditArgs { limit: Some(5), ..args() }, 50).unwrap();
        assert_eq!(filter.limit, Some(5));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let bad = AuditArgs {
            action: Some("publish".into()),
            ..args()
        };
        assert!(audit_filter(&bad, 50).is_err());
    }
}
