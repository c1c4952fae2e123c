use std::sync::atomic::Ordering;
use tracing::{debug, info};

impl super::ForecastScheduler {
    /// Stop all pending timers and the health check. Ticks in flight finish
    /// but do not re-arm until `start_all` runs again.
    pub async fn stop_all_tasks(&self) {
        self.stopped.store(true, Ordering::SeqCst);

        // Stop health check task first
        let mut health_check = self.health_check_handle.lock().await;
        if let Some(handle) = health_check.take() {
            handle.abort();
            info!("🛑 Health check task stopped");
        }
        drop(health_check);

        let mut tasks = self.tasks.lock().await;
        let mut metadata = self.task_metadata.lock().await;

        info!("🛑 Stopping {} scheduled timers...", tasks.len());

        for (uid, entry) in tasks.drain() {
            debug!(
                "  ⏹️  Stopping timer for user {} (armed at {}, delay {}s)",
                uid,
                entry.armed_at.format("%Y-%m-%d %H:%M:%S"),
                entry.delay.as_secs()
            );
            entry.handle.abort();
        }

        metadata.clear();

        info!("✅ All scheduled timers stopped");
    }

    /// Number of timers still waiting to fire
    pub async fn active_task_count(&self) -> usize {
        self.tasks
            .lock()
            .await
            .values()
            .filter(|entry| !entry.handle.is_finished())
            .count()
    }

    pub async fn shutdown(&self) {
        info!("🛑 Shutting down forecast scheduler");
        self.stop_all_tasks().await;
    }
}
