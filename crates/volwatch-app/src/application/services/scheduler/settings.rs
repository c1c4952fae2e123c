use std::time::Duration;
use tracing::{info, instrument};

use volwatch_domain::shared::{DomainError, UserId};
use volwatch_domain::user::UserRecord;

impl super::ForecastScheduler {
    /// Store a new threshold (clearing both daily notification marks) and
    /// trigger an immediate tick.
    #[instrument(skip(self))]
    pub async fn set_threshold(
        &self,
        uid: &UserId,
        threshold: Option<i64>,
    ) -> Result<UserRecord, DomainError> {
        let record = self
            .update_record(uid, |record| {
                record.set_threshold(threshold);
                Ok(())
            })
            .await?;

        info!("Threshold for user {} set to {:?}", uid, threshold);
        self.arm(uid, Duration::ZERO).await;
        Ok(record)
    }

    /// Store a new polling interval in minutes and trigger an immediate tick.
    /// Zero disables re-arming after that tick.
    #[instrument(skip(self))]
    pub async fn set_interval(&self, uid: &UserId, minutes: i64) -> Result<UserRecord, DomainError> {
        let record = self
            .update_record(uid, |record| record.set_interval(minutes))
            .await?;

        info!("Interval for user {} set to {} minutes", uid, minutes);
        self.arm(uid, Duration::ZERO).await;
        Ok(record)
    }

    /// Read-modify-write under the user's lock, so a tick in flight cannot
    /// overwrite the change with its stale copy.
    async fn update_record<F>(&self, uid: &UserId, apply: F) -> Result<UserRecord, DomainError>
    where
        F: FnOnce(&mut UserRecord) -> Result<(), DomainError>,
    {
        let lock = self.user_lock(uid).await;
        let _guard = lock.lock().await;

        let mut record = self.user_repo.get_or_create(uid).await?;
        apply(&mut record)?;
        self.user_repo.save(&record).await?;

        let mut metadata = self.task_metadata.lock().await;
        metadata.entry(uid.clone()).or_default().interval = record.interval();

        Ok(record)
    }
}
