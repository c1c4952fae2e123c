use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fresh forecast; never persisted as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub observed_at: DateTime<Utc>,
    pub forecast: i64,
    pub current_value: i64,
}
