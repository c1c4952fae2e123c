use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::value_objects::{BreachKind, ThresholdBreach};
use crate::forecast::ForecastResult;
use crate::shared::{flexible_time, is_same_utc_day, DomainError, UserId};

/// Persisted per-user forecasting state.
///
/// Serialized as a flat camelCase document; `None` fields are written as
/// explicit `null`s. Older documents (numeric uid, `currentBTCVolume`,
/// RFC 2822 timestamps) still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    uid: UserId,
    interval: Option<u32>,
    threshold: Option<i64>,
    latest_forecast: Option<i64>,
    #[serde(alias = "currentBTCVolume")]
    current_value: Option<i64>,
    #[serde(default, deserialize_with = "flexible_time::deserialize_opt")]
    forecast_exceeded_notified_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_time::deserialize_opt")]
    volume_exceeded_notified_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// A freshly registered user: nothing configured, nothing observed.
    pub fn new(uid: UserId) -> Self {
        Self {
            uid,
            interval: None,
            threshold: None,
            latest_forecast: None,
            current_value: None,
            forecast_exceeded_notified_at: None,
            volume_exceeded_notified_at: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        uid: UserId,
        interval: Option<u32>,
        threshold: Option<i64>,
        latest_forecast: Option<i64>,
        current_value: Option<i64>,
        forecast_exceeded_notified_at: Option<DateTime<Utc>>,
        volume_exceeded_notified_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            uid,
            interval,
            threshold,
            latest_forecast,
            current_value,
            forecast_exceeded_notified_at,
            volume_exceeded_notified_at,
        }
    }

    pub fn uid(&self) -> &UserId {
        &self.uid
    }

    pub fn interval(&self) -> Option<u32> {
        self.interval
    }

    pub fn threshold(&self) -> Option<i64> {
        self.threshold
    }

    pub fn latest_forecast(&self) -> Option<i64> {
        self.latest_forecast
    }

    pub fn current_value(&self) -> Option<i64> {
        self.current_value
    }

    pub fn forecast_exceeded_notified_at(&self) -> Option<DateTime<Utc>> {
        self.forecast_exceeded_notified_at
    }

    pub fn volume_exceeded_notified_at(&self) -> Option<DateTime<Utc>> {
        self.volume_exceeded_notified_at
    }

    /// Users without a threshold never poll and never get notified.
    pub fn is_forecasting_enabled(&self) -> bool {
        self.threshold.is_some()
    }

    /// Delay until the next tick, or `None` when the user should go idle.
    pub fn rearm_delay(&self) -> Option<Duration> {
        match self.interval {
            Some(minutes) if minutes > 0 => Some(Duration::from_secs(u64::from(minutes) * 60)),
            _ => None,
        }
    }

    /// Changing the threshold re-opens both daily notifications.
    pub fn set_threshold(&mut self, threshold: Option<i64>) {
        self.threshold = threshold;
        self.forecast_exceeded_notified_at = None;
        self.volume_exceeded_notified_at = None;
    }

    pub fn set_interval(&mut self, minutes: i64) -> Result<(), DomainError> {
        let minutes = u32::try_from(minutes).map_err(|_| {
            DomainError::InvalidInput(format!(
                "Interval must be between 0 and {} minutes, got {}",
                u32::MAX,
                minutes
            ))
        })?;
        self.interval = Some(minutes);
        Ok(())
    }

    /// Store a complete observation (raw value plus forecast).
    pub fn record_forecast(&mut self, result: &ForecastResult) {
        self.latest_forecast = Some(result.forecast);
        self.current_value = Some(result.current_value);
    }

    /// Store the raw value when no forecast could be derived from it.
    pub fn record_current_value(&mut self, value: i64) {
        self.current_value = Some(value);
    }

    /// Evaluate both daily conditions against the stored values.
    ///
    /// Every returned breach has already been marked as notified at `now`, so
    /// a second call on the same UTC day returns nothing for that kind.
    pub fn evaluate_thresholds(&mut self, now: DateTime<Utc>) -> Vec<ThresholdBreach> {
        let Some(threshold) = self.threshold else {
            return Vec::new();
        };

        let mut breaches = Vec::new();

        if let Some(forecast) = self.latest_forecast {
            if forecast > threshold
                && !Self::notified_on(self.forecast_exceeded_notified_at, now)
            {
                self.forecast_exceeded_notified_at = Some(now);
                breaches.push(ThresholdBreach {
                    kind: BreachKind::Forecast,
                    value: forecast,
                    threshold,
                });
            }
        }

        if let Some(value) = self.current_value {
            if value > threshold && !Self::notified_on(self.volume_exceeded_notified_at, now) {
                self.volume_exceeded_notified_at = Some(now);
                breaches.push(ThresholdBreach {
                    kind: BreachKind::Volume,
                    value,
                    threshold,
                });
            }
        }

        breaches
    }

    fn notified_on(notified_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        notified_at.is_some_and(|at| is_same_utc_day(at, now))
    }
}
