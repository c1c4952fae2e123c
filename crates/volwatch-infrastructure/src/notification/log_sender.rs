use async_trait::async_trait;
use tracing::info;

use volwatch_domain::notification::{NotificationMessage, NotificationSender};
use volwatch_domain::shared::{DomainError, UserId};

/// Writes messages to the log instead of delivering them.
/// Used when no bot token is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(&self, uid: &UserId, message: &NotificationMessage) -> Result<(), DomainError> {
        info!(
            uid = %uid,
            kind = ?message.kind,
            "Notification (not delivered): {}",
            message.text
        );
        Ok(())
    }
}
