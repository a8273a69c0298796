use serde_json::json;

use bursary_db::repos::notification::NotificationFilter;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::NotificationCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `bursary notifications`.
pub async fn handle(
    action: &NotificationCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        NotificationCommands::List {
            user,
            unread,
            limit,
        } => {
            let filter = NotificationFilter {
                user_id: *user,
                unread_only: *unread,
                limit: Some(limit.unwrap_or(ctx.config.general.default_limit)),
            };
            let notifications = ctx.service.list_notifications(&filter).await?;
            output(&notifications, flags.format)
        }
        NotificationCommands::Read { id } => {
            if !ctx.service.mark_notification_read(*id).await? {
                anyhow::bail!("notification {id} not found");
            }
            output(&json!({ "id": id, "read_status": true }), flags.format)
        }
    }
}
