use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use volwatch_domain::shared::{DomainError, UserId};
use volwatch_domain::user::{UserRecord, UserRepository};

use crate::persistence::result_ext::ResultExt;

const RECORD_EXTENSION: &str = "json";

/// One `<uid>.json` document per user.
///
/// Records are never written in place: content goes to a temp file that is
/// fsynced, then hard-linked (create) or renamed (overwrite) into place, so a
/// reader sees either the previous or the next complete document.
pub struct JsonFileUserRepository {
    users_dir: PathBuf,
    temp_counter: AtomicU64,
}

impl JsonFileUserRepository {
    /// Open the store rooted at `users_dir`, creating the directory if needed.
    pub fn open(users_dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let users_dir = users_dir.into();
        std::fs::create_dir_all(&users_dir).map_repo_error("Failed to create users directory")?;
        info!("User store at {}", users_dir.display());

        Ok(Self {
            users_dir,
            temp_counter: AtomicU64::new(0),
        })
    }

    pub fn users_dir(&self) -> &Path {
        &self.users_dir
    }

    fn record_path(&self, uid: &UserId) -> PathBuf {
        self.users_dir
            .join(format!("{}.{}", uid.as_str(), RECORD_EXTENSION))
    }

    /// Hidden, unique per call; never matches `*.json`.
    fn temp_path(&self, uid: &UserId) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        self.users_dir
            .join(format!(".{}.{}.{}.tmp", uid.as_str(), std::process::id(), n))
    }

    async fn write_temp(&self, uid: &UserId, record: &UserRecord) -> Result<PathBuf, DomainError> {
        let bytes = serde_json::to_vec_pretty(record)
            .map_err(|e| DomainError::Serialization(format!("Failed to encode user {uid}: {e}")))?;

        let tmp = self.temp_path(uid);
        let mut file = fs::File::create(&tmp)
            .await
            .map_repo_error("Failed to create temp file")?;
        let written = async {
            file.write_all(&bytes)
                .await
                .map_repo_error("Failed to write temp file")?;
            file.sync_all()
                .await
                .map_repo_error("Failed to sync temp file")
        }
        .await;
        drop(file);

        Self::discard_on_err(&tmp, written).await?;
        Ok(tmp)
    }

    /// A failed write must not leave its temp file behind.
    async fn discard_on_err<T>(
        tmp: &Path,
        result: Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        if result.is_err() {
            Self::discard(tmp).await;
        }
        result
    }

    async fn discard(tmp: &Path) {
        if let Err(e) = fs::remove_file(tmp).await {
            warn!("Failed to remove temp file {}: {}", tmp.display(), e);
        }
    }

    async fn read_record(&self, uid: &UserId) -> Result<UserRecord, DomainError> {
        let path = self.record_path(uid);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DomainError::NotFound(format!("user {uid}")));
            }
            Err(e) => {
                return Err(DomainError::Repository(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let record: UserRecord = serde_json::from_slice(&bytes).map_err(|e| {
            DomainError::Deserialization(format!("Corrupt record {}: {}", path.display(), e))
        })?;

        if record.uid() != uid {
            return Err(DomainError::Deserialization(format!(
                "Record {} belongs to user {}",
                path.display(),
                record.uid()
            )));
        }

        Ok(record)
    }
}

#[async_trait]
impl UserRepository for JsonFileUserRepository {
    async fn get_or_create(&self, uid: &UserId) -> Result<UserRecord, DomainError> {
        match self.read_record(uid).await {
            Ok(record) => return Ok(record),
            Err(DomainError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let record = UserRecord::new(uid.clone());
        let tmp = self.write_temp(uid, &record).await?;
        let linked = fs::hard_link(&tmp, self.record_path(uid)).await;
        Self::discard(&tmp).await;

        match linked {
            Ok(()) => {
                info!("Registered new user {}", uid);
                Ok(record)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("User {} registered concurrently, loading stored record", uid);
                self.read_record(uid).await
            }
            Err(e) => Err(DomainError::Repository(format!(
                "Failed to create record for user {uid}: {e}"
            ))),
        }
    }

    async fn find_by_id(&self, uid: &UserId) -> Result<UserRecord, DomainError> {
        self.read_record(uid).await
    }

    async fn save(&self, record: &UserRecord) -> Result<(), DomainError> {
        let uid = record.uid();
        let tmp = self.write_temp(uid, record).await?;

        if let Err(e) = fs::rename(&tmp, self.record_path(uid)).await {
            Self::discard(&tmp).await;
            return Err(DomainError::Repository(format!(
                "Failed to replace record for user {uid}: {e}"
            )));
        }

        debug!("Saved user {}", uid);
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<UserId>, DomainError> {
        let mut entries = fs::read_dir(&self.users_dir)
            .await
            .map_repo_error("Failed to list users directory")?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_repo_error("Failed to read users directory entry")?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match UserId::parse(stem) {
                Ok(uid) => ids.push(uid),
                Err(e) => warn!("Skipping unexpected file {}: {}", path.display(), e),
            }
        }

        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_record_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileUserRepository::open(dir.path().join("users")).unwrap();

        repo.get_or_create(&uid("42")).await.unwrap();

        let text = std::fs::read_to_string(dir.path().join("users").join("42.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["uid"], "42");
        assert!(json["threshold"].is_null());
        assert!(json.get("volumeExceededNotifiedAt").is_some());
    }

    #[tokio::test]
    async fn test_temp_files_are_not_listed() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileUserRepository::open(dir.path()).unwrap();

        repo.get_or_create(&uid("1")).await.unwrap();
        std::fs::write(dir.path().join(".2.99.0.tmp"), b"{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join("bad.name.json"), b"{}").unwrap();

        let ids = repo.list_ids().await.unwrap();
        assert_eq!(ids, vec![uid("1")]);
    }

    #[tokio::test]
    async fn test_failed_write_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join(".5.1.0.tmp");
        std::fs::write(&tmp, b"{\"uid\":").unwrap();

        let failed: Result<(), DomainError> = Err(DomainError::Repository(
            "Failed to write temp file: No space left on device".into(),
        ));
        let err = JsonFileUserRepository::discard_on_err(&tmp, failed)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Repository(_)));
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn test_successful_write_keeps_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join(".5.1.1.tmp");
        std::fs::write(&tmp, b"{}").unwrap();

        JsonFileUserRepository::discard_on_err(&tmp, Ok(()))
            .await
            .unwrap();
        assert!(tmp.exists());
    }

    #[tokio::test]
    async fn test_saves_leave_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileUserRepository::open(dir.path()).unwrap();

        let mut record = repo.get_or_create(&uid("8")).await.unwrap();
        record.set_threshold(Some(900));
        repo.save(&record).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileUserRepository::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("7.json"), b"{ not json").unwrap();

        let err = repo.find_by_id(&uid("7")).await.unwrap_err();
        assert!(matches!(err, DomainError::Deserialization(_)));

        // get_or_create must not clobber a file it cannot read
        assert!(repo.get_or_create(&uid("7")).await.is_err());
        let text = std::fs::read_to_string(dir.path().join("7.json")).unwrap();
        assert_eq!(text, "{ not json");
    }
}
