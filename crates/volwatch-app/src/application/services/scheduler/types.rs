use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;

use volwatch_domain::notification::NotificationKind;
use volwatch_domain::shared::UserId;

use crate::application::services::Observation;

/// A pending timer for one user
pub(super) struct ScheduleEntry {
    pub handle: JoinHandle<()>,
    pub armed_at: DateTime<Utc>,
    pub delay: Duration,
}

/// Task metadata for health monitoring and recovery
#[derive(Debug, Clone, Default)]
pub(super) struct TaskMetadata {
    /// Last interval seen in the user's record
    pub interval: Option<u32>,
    pub last_tick: Option<DateTime<Utc>>,
    pub ticking: bool,
    /// The last tick left a timer behind
    pub expects_rearm: bool,
}

impl TaskMetadata {
    pub fn rearm_delay(&self) -> Option<Duration> {
        match self.interval {
            Some(minutes) if minutes > 0 => Some(Duration::from_secs(u64::from(minutes) * 60)),
            _ => None,
        }
    }
}

/// Per-user scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    /// No timer pending and no tick running
    Idle,
    /// A timer is pending
    Armed,
    /// A tick is running or queued behind the user's lock
    Ticking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// `None` when the provider failed
    pub observation: Option<Observation>,
    /// Messages handed to the notifier, delivered or not
    pub notifications: Vec<NotificationKind>,
    pub persisted: bool,
    pub next_tick_in: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No stored record for the uid; the user stays idle
    UserNotFound,
    /// Threshold unset; the user goes idle
    Disabled,
    Completed(TickReport),
    /// The record could not be loaded. Re-armed from the last known interval, if any
    LoadFailed { next_tick_in: Option<Duration> },
}

/// Findings of one health check pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    /// Users expected to have a pending timer that have none
    pub missing_timers: Vec<UserId>,
    /// Users whose last tick is older than twice their interval
    pub stale: Vec<UserId>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.missing_timers.is_empty() && self.stale.is_empty()
    }
}
