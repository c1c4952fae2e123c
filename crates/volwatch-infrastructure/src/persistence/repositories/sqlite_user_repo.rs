use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use volwatch_domain::shared::flexible_time::parse_datetime_flexible;
use volwatch_domain::shared::{DomainError, UserId};
use volwatch_domain::user::{UserRecord, UserRepository};

use crate::persistence::result_ext::ResultExt;

#[derive(FromRow)]
struct UserRow {
    uid: String,
    interval_minutes: Option<i64>,
    threshold: Option<i64>,
    latest_forecast: Option<i64>,
    current_value: Option<i64>,
    forecast_exceeded_notified_at: Option<String>,
    volume_exceeded_notified_at: Option<String>,
}

impl UserRow {
    fn to_record(self) -> Result<UserRecord, DomainError> {
        let uid = UserId::parse(&self.uid)?;

        let interval = self
            .interval_minutes
            .map(u32::try_from)
            .transpose()
            .map_err(|_| {
                DomainError::Deserialization(format!(
                    "Stored interval out of range for user {}",
                    self.uid
                ))
            })?;

        Ok(UserRecord::restore(
            uid,
            interval,
            self.threshold,
            self.latest_forecast,
            self.current_value,
            parse_timestamp(self.forecast_exceeded_notified_at)?,
            parse_timestamp(self.volume_exceeded_notified_at)?,
        ))
    }
}

fn parse_timestamp(raw: Option<String>) -> Result<Option<DateTime<Utc>>, DomainError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_datetime_flexible(&s))
        .transpose()
}

pub struct SqliteUserRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteUserRepository {
    const SELECT_QUERY: &'static str = r#"
        SELECT uid, interval_minutes, threshold, latest_forecast, current_value,
               forecast_exceeded_notified_at, volume_exceeded_notified_at
        FROM users
        WHERE uid = ?1
    "#;

    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    async fn fetch(&self, uid: &UserId) -> Result<Option<UserRecord>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(Self::SELECT_QUERY)
            .bind(uid.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_repo_error("Find user")?;

        row.map(UserRow::to_record).transpose()
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn get_or_create(&self, uid: &UserId) -> Result<UserRecord, DomainError> {
        let result = sqlx::query("INSERT INTO users (uid) VALUES (?1) ON CONFLICT(uid) DO NOTHING")
            .bind(uid.as_str())
            .execute(&*self.pool)
            .await
            .map_repo_error("Register user")?;

        if result.rows_affected() > 0 {
            info!("Registered new user {}", uid);
        }

        self.fetch(uid)
            .await?
            .ok_or_else(|| DomainError::Repository(format!("User {uid} vanished after insert")))
    }

    async fn find_by_id(&self, uid: &UserId) -> Result<UserRecord, DomainError> {
        self.fetch(uid)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {uid}")))
    }

    async fn save(&self, record: &UserRecord) -> Result<(), DomainError> {
        let start = Instant::now();

        let query = r#"
            INSERT INTO users (uid, interval_minutes, threshold, latest_forecast, current_value,
                               forecast_exceeded_notified_at, volume_exceeded_notified_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(uid) DO UPDATE SET
                interval_minutes = ?2,
                threshold = ?3,
                latest_forecast = ?4,
                current_value = ?5,
                forecast_exceeded_notified_at = ?6,
                volume_exceeded_notified_at = ?7
        "#;

        sqlx::query(query)
            .bind(record.uid().as_str())
            .bind(record.interval().map(i64::from))
            .bind(record.threshold())
            .bind(record.latest_forecast())
            .bind(record.current_value())
            .bind(record.forecast_exceeded_notified_at().map(|t| t.to_rfc3339()))
            .bind(record.volume_exceeded_notified_at().map(|t| t.to_rfc3339()))
            .execute(&*self.pool)
            .await
            .map_repo_error("Save user")?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 {
            warn!("Slow save for user {}: {:?}", record.uid(), elapsed);
        } else {
            debug!("Saved user {} in {:?}", record.uid(), elapsed);
        }
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<UserId>, DomainError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT uid FROM users ORDER BY uid")
            .fetch_all(&*self.pool)
            .await
            .map_repo_error("List users")?;

        let mut ids = Vec::with_capacity(rows.len());
        for (raw,) in rows {
            match UserId::parse(&raw) {
                Ok(uid) => ids.push(uid),
                Err(e) => warn!("Skipping malformed uid '{}': {}", raw, e),
            }
        }
        Ok(ids)
    }
}
