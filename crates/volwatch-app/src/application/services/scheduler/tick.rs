use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use volwatch_domain::notification::NotificationMessage;
use volwatch_domain::shared::{DomainError, ErrorSeverity, UserId};

use super::types::{TickOutcome, TickReport};
use crate::application::services::Observation;

impl super::ForecastScheduler {
    /// Poll, evaluate and notify for one user, then re-arm per the stored interval.
    ///
    /// Never fails: every error is logged and folded into the outcome.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn tick(&self, uid: &UserId) -> TickOutcome {
        let lock = self.user_lock(uid).await;
        let _guard = lock.lock().await;

        self.cancel(uid).await;
        let started_at = self.clock.now();
        self.begin_tick(uid, started_at).await;

        let outcome = self.run_tick(uid, started_at).await;

        let rearmed = match &outcome {
            TickOutcome::Completed(report) => report.next_tick_in.is_some(),
            TickOutcome::LoadFailed { next_tick_in } => next_tick_in.is_some(),
            TickOutcome::UserNotFound | TickOutcome::Disabled => false,
        };
        self.finish_tick(uid, &outcome, rearmed).await;

        outcome
    }

    async fn run_tick(&self, uid: &UserId, now: DateTime<Utc>) -> TickOutcome {
        let mut record = match self.user_repo.find_by_id(uid).await {
            Ok(record) => record,
            Err(DomainError::NotFound(_)) => {
                error!("❌ Tick for unknown user {}, going idle", uid);
                return TickOutcome::UserNotFound;
            }
            Err(e) => {
                log_tick_error(uid, "load", &e);
                let delay = self.last_known_delay(uid).await;
                if let Some(delay) = delay {
                    self.arm(uid, delay).await;
                }
                return TickOutcome::LoadFailed { next_tick_in: delay };
            }
        };

        {
            let mut metadata = self.task_metadata.lock().await;
            metadata.entry(uid.clone()).or_default().interval = record.interval();
        }

        if !record.is_forecasting_enabled() {
            info!("No threshold for user {}, going idle", uid);
            return TickOutcome::Disabled;
        }

        let mut notifications = Vec::new();
        let observation = match self.forecast_service.observe_at(now).await {
            Ok(observation) => Some(observation),
            Err(e) => {
                log_tick_error(uid, "forecast", &e);
                let message = NotificationMessage::forecast_failed();
                self.notification_service.notify(uid, &message).await;
                notifications.push(message.kind);
                None
            }
        };

        match observation {
            Some(Observation::Forecast(result)) => {
                record.record_forecast(&result);
                for breach in record.evaluate_thresholds(now) {
                    let message = NotificationMessage::threshold_exceeded(&breach);
                    self.notification_service.notify(uid, &message).await;
                    notifications.push(message.kind);
                }
            }
            Some(Observation::Indeterminate { current_value, .. }) => {
                debug!("Storing raw value {} without evaluation", current_value);
                record.record_current_value(current_value);
            }
            None => {}
        }

        let persisted = match self.user_repo.save(&record).await {
            Ok(()) => true,
            Err(e) => {
                log_tick_error(uid, "persist", &e);
                false
            }
        };

        let next_tick_in = record.rearm_delay();
        match next_tick_in {
            Some(delay) => self.arm(uid, delay).await,
            None => debug!("No interval for user {}, going idle", uid),
        }

        TickOutcome::Completed(TickReport {
            observation,
            notifications,
            persisted,
            next_tick_in,
        })
    }

    async fn begin_tick(&self, uid: &UserId, at: DateTime<Utc>) {
        let mut metadata = self.task_metadata.lock().await;
        let meta = metadata.entry(uid.clone()).or_default();
        meta.ticking = true;
        meta.last_tick = Some(at);
    }

    async fn finish_tick(&self, uid: &UserId, outcome: &TickOutcome, rearmed: bool) {
        let mut metadata = self.task_metadata.lock().await;
        if matches!(outcome, TickOutcome::UserNotFound) {
            metadata.remove(uid);
            return;
        }
        let meta = metadata.entry(uid.clone()).or_default();
        meta.ticking = false;
        meta.expects_rearm = rearmed;
    }

    async fn last_known_delay(&self, uid: &UserId) -> Option<std::time::Duration> {
        let metadata = self.task_metadata.lock().await;
        metadata.get(uid).and_then(|meta| meta.rearm_delay())
    }
}

fn log_tick_error(uid: &UserId, stage: &str, e: &DomainError) {
    if e.is_recoverable() {
        warn!("⚠️  Tick {} failed for user {}: {}", stage, uid, e.format_with_code());
        return;
    }
    match e.severity() {
        ErrorSeverity::Critical => {
            error!("🚨 Tick {} failed for user {}: {}", stage, uid, e.format_with_code())
        }
        _ => error!("❌ Tick {} failed for user {}: {}", stage, uid, e.format_with_code()),
    }
}
