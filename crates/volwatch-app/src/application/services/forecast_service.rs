use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use volwatch_domain::forecast::{project, ForecastResult, IndicatorProvider};
use volwatch_domain::shared::{Clock, DomainError};

/// What one poll of the indicator produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Forecast(ForecastResult),
    /// The raw value was fetched but no forecast can be derived at this time.
    Indeterminate {
        observed_at: DateTime<Utc>,
        current_value: i64,
    },
}

/// Fetches the indicator and projects it to an end-of-day forecast
pub struct ForecastService {
    provider: Arc<dyn IndicatorProvider>,
    clock: Arc<dyn Clock>,
}

impl ForecastService {
    pub fn new(provider: Arc<dyn IndicatorProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { provider, clock }
    }

    /// Poll the provider as of `now`. `Err` means the provider failed.
    #[instrument(skip(self))]
    pub async fn observe_at(&self, now: DateTime<Utc>) -> Result<Observation, DomainError> {
        let current_value = self.provider.fetch_current_value(now).await?;

        match project(current_value, now) {
            Ok(forecast) => {
                debug!(current_value, forecast, "Forecast computed");
                Ok(Observation::Forecast(ForecastResult {
                    observed_at: now,
                    forecast,
                    current_value,
                }))
            }
            Err(DomainError::IndeterminateForecast(reason)) => {
                warn!("Forecast indeterminate: {}", reason);
                Ok(Observation::Indeterminate {
                    observed_at: now,
                    current_value,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// One-shot forecast for the current instant.
    pub async fn calculate_forecast_now(&self) -> Result<ForecastResult, DomainError> {
        let now = self.clock.now();
        match self.observe_at(now).await? {
            Observation::Forecast(result) => Ok(result),
            Observation::Indeterminate { current_value, .. } => {
                Err(DomainError::IndeterminateForecast(format!(
                    "current value {} at {} cannot be projected",
                    current_value,
                    now.to_rfc3339()
                )))
            }
        }
    }
}
