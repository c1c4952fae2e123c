#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;
use volwatch_domain::user::UserRepository;
use volwatch_infrastructure::persistence::repositories::{
    JsonFileUserRepository, SqliteUserRepository,
};
use volwatch_infrastructure::persistence::Database;

/// In-memory SQLite store with the schema applied.
pub async fn setup_sqlite_repo() -> Arc<dyn UserRepository> {
    let db = Database::in_memory().await.expect("Open in-memory DB");
    db.run_migrations().await.expect("Run migrations");
    Arc::new(SqliteUserRepository::new(Arc::new(db.pool().clone())))
}

/// JSON-file store in a fresh temp dir. Keep the `TempDir` alive for the test.
pub fn setup_json_repo() -> (Arc<dyn UserRepository>, TempDir) {
    let dir = tempfile::tempdir().expect("Create temp dir");
    let repo = JsonFileUserRepository::open(dir.path().join("users")).expect("Open JSON store");
    (Arc::new(repo), dir)
}
