use clap::Subcommand;

/// Notification inbox commands.
#[derive(Clone, Debug, Subcommand)]
pub enum NotificationCommands {
    /// List notifications, newest first.
    List {
        /// Recipient; broadcasts are always included
        #[arg(long)]
        user: Option<i64>,
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
        /// Max notifications (defaults to `[general] default_limit`)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Mark a notification as read.
    Read { id: i64 },
}
