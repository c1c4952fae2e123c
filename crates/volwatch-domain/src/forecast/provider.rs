use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::shared::DomainError;

/// Source of today's raw cumulative indicator value.
///
/// Every failure (transport, timeout, malformed payload) must surface as
/// `DomainError::ProviderUnavailable`.
#[async_trait]
pub trait IndicatorProvider: Send + Sync {
    async fn fetch_current_value(&self, now: DateTime<Utc>) -> Result<i64, DomainError>;
}
