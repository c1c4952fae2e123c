use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::presentation::state::AppState;
use volwatch_domain::shared::SystemClock;
use volwatch_domain::user::UserRepository;
use volwatch_infrastructure::config::{AppConfig, StorageBackend};
use volwatch_infrastructure::http::BlockchairProvider;
use volwatch_infrastructure::notification::create_sender;
use volwatch_infrastructure::persistence::{
    repositories::{JsonFileUserRepository, SqliteUserRepository},
    Database,
};

pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let startup_started_at = Instant::now();
    let timeouts = config.timeouts();

    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.data_dir.display()
        )
    })?;

    let started_at = Instant::now();
    let (db, user_repo) = match config.storage {
        StorageBackend::Json => {
            let repo = JsonFileUserRepository::open(config.users_dir())
                .context("Failed to open JSON user store")?;
            (None, Arc::new(repo) as Arc<dyn UserRepository>)
        }
        StorageBackend::Sqlite => {
            info!("🔌 Connecting to database...");
            let database = Database::new(&config.database_path(), timeouts.db_acquire)
                .await
                .context("Failed to open database")?;
            database
                .run_migrations()
                .await
                .context("Failed to run migrations")?;
            let pool = Arc::new(database.pool().clone());
            let repo = Arc::new(SqliteUserRepository::new(pool)) as Arc<dyn UserRepository>;
            (Some(Arc::new(database)), repo)
        }
    };
    info!(
        "✓ {:?} user store ready ({}ms)",
        config.storage,
        started_at.elapsed().as_millis()
    );

    let provider = Arc::new(
        BlockchairProvider::new(&config.indicator_url, &timeouts)
            .context("Failed to build indicator provider")?,
    );
    let sender = create_sender(&config.telegram, &timeouts)
        .context("Failed to build notification sender")?;

    let state = AppState::assemble(
        config,
        db,
        user_repo,
        provider,
        sender,
        Arc::new(SystemClock),
    );

    info!(
        "✅ App state initialized ({}ms)",
        startup_started_at.elapsed().as_millis()
    );
    Ok(state)
}
