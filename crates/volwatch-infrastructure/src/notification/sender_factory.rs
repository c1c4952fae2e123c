use std::sync::Arc;
use tracing::{info, warn};

use volwatch_domain::notification::NotificationSender;
use volwatch_domain::shared::DomainError;

use super::log_sender::LogNotificationSender;
use super::telegram::TelegramBotSender;
use crate::config::{TelegramConfig, TimeoutConfig};

/// Create the notification sender for this process.
///
/// A configured bot token selects Telegram; otherwise messages are only logged.
pub fn create_sender(
    config: &TelegramConfig,
    timeouts: &TimeoutConfig,
) -> Result<Arc<dyn NotificationSender>, DomainError> {
    match config.bot_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => {
            let sender =
                TelegramBotSender::new(token.to_string(), &config.api_base, timeouts.notification)
                    .map_err(|e| DomainError::Configuration(format!("{e:#}")))?;
            info!("Telegram notifications enabled via {}", config.api_base);
            Ok(Arc::new(sender))
        }
        _ => {
            warn!("No bot token configured, notifications will only be logged");
            Ok(Arc::new(LogNotificationSender))
        }
    }
}
