use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::{DomainError, UserId};
use crate::user::{BreachKind, ThresholdBreach};

/// What a message is about; lets senders and tests tell messages apart
/// without parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ForecastExceeded,
    VolumeExceeded,
    ForecastFailed,
    /// Reply to an on-demand forecast request
    ForecastReport,
}

/// Notification message to be sent
///
/// `text` uses `*bold*` emphasis and no other markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub kind: NotificationKind,
    pub text: String,
}

impl NotificationMessage {
    pub fn new(kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn threshold_exceeded(breach: &ThresholdBreach) -> Self {
        match breach.kind {
            BreachKind::Forecast => Self::new(
                NotificationKind::ForecastExceeded,
                format!(
                    "Forecast *{}* BTC exceeded threshold *{}* BTC",
                    breach.value, breach.threshold
                ),
            ),
            BreachKind::Volume => Self::new(
                NotificationKind::VolumeExceeded,
                format!(
                    "Current volume *{}* BTC exceeded threshold *{}* BTC",
                    breach.value, breach.threshold
                ),
            ),
        }
    }

    pub fn forecast_failed() -> Self {
        Self::new(
            NotificationKind::ForecastFailed,
            "Forecast failed: could not load current volume",
        )
    }
}

/// Notification sender trait (Strategy pattern)
/// Each delivery channel implements this trait
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver a message to one user. Callers do not retry on error.
    async fn send(&self, uid: &UserId, message: &NotificationMessage) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_exceeded_text() {
        let message = NotificationMessage::threshold_exceeded(&ThresholdBreach {
            kind: BreachKind::Forecast,
            value: 1002,
            threshold: 900,
        });

        assert_eq!(message.kind, NotificationKind::ForecastExceeded);
        assert_eq!(
            message.text,
            "Forecast *1002* BTC exceeded threshold *900* BTC"
        );
    }

    #[test]
    fn test_volume_exceeded_text() {
        let message = NotificationMessage::threshold_exceeded(&ThresholdBreach {
            kind: BreachKind::Volume,
            value: 950,
            threshold: 900,
        });

        assert_eq!(message.kind, NotificationKind::VolumeExceeded);
        assert!(message.text.contains("*950*"));
    }
}
