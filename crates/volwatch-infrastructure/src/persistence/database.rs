use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use volwatch_domain::shared::DomainError;

use super::result_ext::ResultExt;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file at `db_path`.
    pub async fn new(db_path: &Path, acquire_timeout: Duration) -> Result<Self, DomainError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_repo_error("Failed to create DB directory")?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(acquire_timeout)
            .connect(&format!("sqlite://{}?mode=rwc", db_path.display()))
            .await
            .map_repo_error("Failed to open database")?;

        info!("Opened user database at {}", db_path.display());
        Ok(Self { pool })
    }

    /// Single-connection in-memory database, for tests and dry runs.
    pub async fn in_memory() -> Result<Self, DomainError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_repo_error("Failed to open in-memory database")?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), DomainError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::Infrastructure(format!("Migration failed: {e}")))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_create_users_table() {
        let db = Database::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();

        let columns: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info('users')")
            .fetch_all(db.pool())
            .await
            .unwrap();
        let names: Vec<&str> = columns.iter().map(|(n,)| n.as_str()).collect();
        assert!(names.contains(&"uid"));
        assert!(names.contains(&"volume_exceeded_notified_at"));
    }

    #[tokio::test]
    async fn test_migrations_are_rerunnable() {
        let db = Database::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        db.run_migrations().await.unwrap();

        let applied: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _sqlx_migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(applied.0, 1);
    }
}
