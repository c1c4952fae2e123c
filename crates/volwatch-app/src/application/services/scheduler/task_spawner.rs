use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use volwatch_domain::shared::UserId;

use super::types::ScheduleEntry;

impl super::ForecastScheduler {
    /// Replace any pending timer for `uid` with one firing after `delay`.
    pub(super) async fn arm(&self, uid: &UserId, delay: Duration) {
        if self.is_stopped() {
            return;
        }

        let handle = self.spawn_timer(uid.clone(), delay);
        let entry = ScheduleEntry {
            handle,
            armed_at: self.clock.now(),
            delay,
        };

        let mut tasks = self.tasks.lock().await;
        if let Some(old) = tasks.insert(uid.clone(), entry) {
            debug!("Replacing pending timer for user {}", uid);
            old.handle.abort();
        }

        info!("⏱️  Next tick for user {} in {} seconds", uid, delay.as_secs());
    }

    /// Drop the pending timer for `uid`. A tick it already spawned keeps running.
    pub(super) async fn cancel(&self, uid: &UserId) -> bool {
        let mut tasks = self.tasks.lock().await;
        match tasks.remove(uid) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Must stay a plain fn: the tick re-arms through here.
    fn spawn_timer(&self, uid: UserId, delay: Duration) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(async move {
                scheduler.tick(&uid).await;
            });
        })
    }
}
