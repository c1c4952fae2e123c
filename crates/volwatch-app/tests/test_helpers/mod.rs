#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use volwatch_app::AppState;
use volwatch_domain::forecast::IndicatorProvider;
use volwatch_domain::notification::{NotificationMessage, NotificationSender};
use volwatch_domain::shared::{Clock, DomainError, UserId};
use volwatch_infrastructure::config::AppConfig;
use volwatch_infrastructure::persistence::repositories::JsonFileUserRepository;

pub struct FixedProvider(pub Option<i64>);

#[async_trait]
impl IndicatorProvider for FixedProvider {
    async fn fetch_current_value(&self, _now: DateTime<Utc>) -> Result<i64, DomainError> {
        self.0
            .ok_or_else(|| DomainError::ProviderUnavailable("unreachable".into()))
    }
}

#[derive(Default)]
pub struct RecordingSender {
    pub messages: tokio::sync::RwLock<Vec<(UserId, NotificationMessage)>>,
}

impl RecordingSender {
    pub async fn texts(&self) -> Vec<String> {
        self.messages
            .read()
            .await
            .iter()
            .map(|(_, message)| message.text.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, uid: &UserId, message: &NotificationMessage) -> Result<(), DomainError> {
        self.messages
            .write()
            .await
            .push((uid.clone(), message.clone()));
        Ok(())
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap()
}

/// AppState over a JSON store in a temp dir. Keep the `TempDir` alive for the test.
pub fn json_app_state(value: Option<i64>) -> (AppState, Arc<RecordingSender>, TempDir) {
    let dir = tempfile::tempdir().expect("Create temp dir");
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let repo = JsonFileUserRepository::open(config.users_dir()).expect("Open JSON store");
    let sender = Arc::new(RecordingSender::default());

    let state = AppState::assemble(
        config,
        None,
        Arc::new(repo),
        Arc::new(FixedProvider(value)),
        sender.clone(),
        Arc::new(FixedClock(noon())),
    );
    (state, sender, dir)
}

/// Poll until `sender` holds `count` messages or a second passes.
pub async fn wait_for_messages(sender: &RecordingSender, count: usize) {
    for _ in 0..50 {
        if sender.messages.read().await.len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
