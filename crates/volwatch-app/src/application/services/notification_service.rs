use std::sync::Arc;
use tracing::{error, info};

use volwatch_domain::notification::{NotificationMessage, NotificationSender};
use volwatch_domain::shared::UserId;

/// Notification application service
/// Delivers messages through the configured sender; failures are logged, never retried
pub struct NotificationService {
    sender: Arc<dyn NotificationSender>,
}

impl NotificationService {
    pub fn new(sender: Arc<dyn NotificationSender>) -> Self {
        Self { sender }
    }

    /// Returns whether the sender accepted the message.
    pub async fn notify(&self, uid: &UserId, message: &NotificationMessage) -> bool {
        match self.sender.send(uid, message).await {
            Ok(()) => {
                info!("Sent {:?} notification to user {}", message.kind, uid);
                true
            }
            Err(e) => {
                error!(
                    "Failed to send {:?} notification to user {}: {}",
                    message.kind, uid, e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use volwatch_domain::shared::DomainError;

    struct FailingSender;

    #[async_trait]
    impl NotificationSender for FailingSender {
        async fn send(&self, _uid: &UserId, _message: &NotificationMessage) -> Result<(), DomainError> {
            Err(DomainError::Notification("chat not found".into()))
        }
    }

    #[tokio::test]
    async fn test_send_failure_is_swallowed() {
        let service = NotificationService::new(Arc::new(FailingSender));
        let delivered = service
            .notify(
                &UserId::parse("1").unwrap(),
                &NotificationMessage::forecast_failed(),
            )
            .await;
        assert!(!delivered);
    }
}
