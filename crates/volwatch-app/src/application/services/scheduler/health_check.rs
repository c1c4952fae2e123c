use std::time::Duration;
use tracing::{error, info, warn};

use super::types::HealthReport;

impl super::ForecastScheduler {
    /// Start health check background task to monitor user timers
    pub async fn start_health_check_task(&self, every: Duration) {
        let scheduler = self.clone();

        let handle = tokio::spawn(async move {
            let mut check_interval = tokio::time::interval(every);
            // the first tick completes immediately
            check_interval.tick().await;

            loop {
                check_interval.tick().await;
                let report = scheduler.check_health().await;
                if report.is_healthy() {
                    continue;
                }
                for uid in &report.missing_timers {
                    error!("🔴 Health Check: timer for user {} died without re-arming", uid);
                }
                for uid in &report.stale {
                    warn!("⚠️  Health Check: user {} has not ticked in over two intervals", uid);
                }
            }
        });

        let mut health_check = self.health_check_handle.lock().await;
        if let Some(old) = health_check.replace(handle) {
            old.abort();
        }

        info!(
            "✅ Health check task started (checking every {} seconds)",
            every.as_secs()
        );
    }

    /// One pass over the user metadata.
    pub async fn check_health(&self) -> HealthReport {
        let now = self.clock.now();
        let tasks = self.tasks.lock().await;
        let metadata = self.task_metadata.lock().await;

        let mut report = HealthReport::default();
        for (uid, meta) in metadata.iter() {
            if meta.ticking || !meta.expects_rearm {
                continue;
            }
            if !tasks.contains_key(uid) {
                report.missing_timers.push(uid.clone());
                continue;
            }
            if let (Some(last_tick), Some(delay)) = (meta.last_tick, meta.rearm_delay()) {
                let Ok(limit) = chrono::Duration::from_std(delay * 2) else {
                    continue;
                };
                if now - last_tick > limit {
                    report.stale.push(uid.clone());
                }
            }
        }

        report.missing_timers.sort();
        report.stale.sort();
        report
    }
}
