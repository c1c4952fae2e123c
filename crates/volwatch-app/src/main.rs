use anyhow::Context;
use volwatch_app::AppState;
use volwatch_infrastructure::config::AppConfig;
use volwatch_infrastructure::logging::{get_log_dir, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    match init_logger(config.log_dir(), config.log_stdout) {
        Ok(_) => {
            tracing::info!("🚀 volwatch starting...");
            if let Some(dir) = get_log_dir() {
                tracing::info!("📝 File logging initialized at: {}", dir.display());
            }
        }
        Err(e) => {
            eprintln!("⚠️  Failed to initialize file logging: {}", e);
            eprintln!("   Falling back to console logging only");

            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .try_init();
        }
    }

    tracing::info!("🚀 Starting app state initialization...");
    let state = AppState::new(config).await?;

    let armed = state.start_all().await.context("Failed to arm stored users")?;
    state.start_health_check().await;
    tracing::info!("✅ volwatch running with {} users armed", armed);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("🛑 Shutdown requested");
    state.shutdown().await;
    Ok(())
}
