use async_trait::async_trait;
use tracing::debug;

use volwatch_domain::notification::{NotificationMessage, NotificationSender};
use volwatch_domain::shared::{DomainError, UserId};

#[async_trait]
impl NotificationSender for super::TelegramBotSender {
    async fn send(&self, uid: &UserId, message: &NotificationMessage) -> Result<(), DomainError> {
        let url = self.build_send_url();
        let payload = self.build_payload(uid, message);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors carry the URL, which carries the token
                DomainError::Notification(format!(
                    "Failed to send Telegram message: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Notification(format!(
                "Telegram sendMessage failed with status {}: {}",
                status, body
            )));
        }

        let resp_body: serde_json::Value = response.json().await.map_err(|e| {
            DomainError::Notification(format!(
                "Failed to parse Telegram response: {}",
                e.without_url()
            ))
        })?;

        // Telegram returns {"ok":true,...} on success
        if resp_body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let description = resp_body
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or("Unknown error");
            return Err(DomainError::Notification(format!(
                "Telegram rejected message: {}",
                description
            )));
        }

        debug!("Sent {:?} message to user {}", message.kind, uid);
        Ok(())
    }
}
