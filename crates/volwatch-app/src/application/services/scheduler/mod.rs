mod health_check;
mod settings;
mod task_manager;
mod task_spawner;
mod tick;
mod types;


use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use volwatch_domain::shared::{Clock, DomainError, UserId};
use volwatch_domain::user::UserRepository;

use super::{ForecastService, NotificationService};
use types::{ScheduleEntry, TaskMetadata};

pub use types::{HealthReport, ScheduleState, TickOutcome, TickReport};

/// One in-memory timer per user.
///
/// A timer sleeps and then spawns the user's tick as a detached task, so
/// cancelling a timer never interrupts a tick already in flight. Ticks and
/// settings changes for the same user are serialized by a per-user lock.
#[derive(Clone)]
pub struct ForecastScheduler {
    /// Pending timers mapped by user
    tasks: Arc<Mutex<HashMap<UserId, ScheduleEntry>>>,
    /// Task metadata for health monitoring
    task_metadata: Arc<Mutex<HashMap<UserId, TaskMetadata>>>,
    user_locks: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
    /// Health check task handle
    health_check_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    /// Set by `stop_all_tasks`; blocks re-arming until `start_all`
    stopped: Arc<AtomicBool>,
    user_repo: Arc<dyn UserRepository>,
    forecast_service: Arc<ForecastService>,
    notification_service: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
}

impl ForecastScheduler {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        forecast_service: Arc<ForecastService>,
        notification_service: Arc<NotificationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
            task_metadata: Arc::new(Mutex::new(HashMap::new())),
            user_locks: Arc::new(Mutex::new(HashMap::new())),
            health_check_handle: Arc::new(Mutex::new(None)),
            stopped: Arc::new(AtomicBool::new(false)),
            user_repo,
            forecast_service,
            notification_service,
            clock,
        }
    }

    /// Arm an immediate tick for every stored user. Returns how many were armed.
    #[instrument(skip(self))]
    pub async fn start_all(&self) -> Result<usize, DomainError> {
        self.stopped.store(false, Ordering::SeqCst);

        let uids = self.user_repo.list_ids().await?;
        info!("Found {} stored users", uids.len());

        for uid in &uids {
            self.arm(uid, std::time::Duration::ZERO).await;
        }

        info!("✅ Armed {} forecast timers", uids.len());
        Ok(uids.len())
    }

    pub async fn state(&self, uid: &UserId) -> ScheduleState {
        let tasks = self.tasks.lock().await;
        let metadata = self.task_metadata.lock().await;

        if metadata.get(uid).is_some_and(|meta| meta.ticking) {
            return ScheduleState::Ticking;
        }
        match tasks.get(uid) {
            Some(entry) if !entry.handle.is_finished() => ScheduleState::Armed,
            // fired; its tick is waiting for the user's lock
            Some(_) => ScheduleState::Ticking,
            None => ScheduleState::Idle,
        }
    }

    async fn user_lock(&self, uid: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        Arc::clone(locks.entry(uid.clone()).or_default())
    }

    fn is_stopped(&self) -> bool {
        let stopped = self.stopped.load(Ordering::SeqCst);
        if stopped {
            warn!("Scheduler stopped, not arming timers");
        }
        stopped
    }
}
