use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::application::dtos::{ForecastReportDto, UserDto};
use crate::application::services::{ForecastScheduler, ForecastService, NotificationService};
use volwatch_domain::forecast::{ForecastResult, IndicatorProvider};
use volwatch_domain::notification::{NotificationMessage, NotificationSender};
use volwatch_domain::shared::{Clock, DomainError, UserId};
use volwatch_domain::user::{UserRecord, UserRepository};
use volwatch_infrastructure::config::AppConfig;
use volwatch_infrastructure::persistence::Database;

pub struct Runtime {
    pub config: AppConfig,
    /// Present when the SQLite backend is in use
    pub db: Option<Arc<Database>>,
    pub clock: Arc<dyn Clock>,
}

pub struct Repositories {
    pub user: Arc<dyn UserRepository>,
}

pub struct Services {
    pub forecast: Arc<ForecastService>,
    pub notification: Arc<NotificationService>,
    pub scheduler: Arc<ForecastScheduler>,
}

/// Entry point for the chat front end: every operation names its user explicitly.
pub struct AppState {
    pub runtime: Runtime,
    pub repositories: Repositories,
    pub services: Services,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        crate::presentation::bootstrap::build_app_state(config).await
    }

    /// Wire services around already-built adapters.
    pub fn assemble(
        config: AppConfig,
        db: Option<Arc<Database>>,
        user_repo: Arc<dyn UserRepository>,
        provider: Arc<dyn IndicatorProvider>,
        sender: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let forecast = Arc::new(ForecastService::new(provider, clock.clone()));
        let notification = Arc::new(NotificationService::new(sender));
        let scheduler = Arc::new(ForecastScheduler::new(
            user_repo.clone(),
            forecast.clone(),
            notification.clone(),
            clock.clone(),
        ));

        Self {
            runtime: Runtime { config, db, clock },
            repositories: Repositories { user: user_repo },
            services: Services {
                forecast,
                notification,
                scheduler,
            },
        }
    }

    /// Idempotent; an existing record is returned unchanged.
    pub async fn register_user(&self, uid: &UserId) -> Result<UserRecord, DomainError> {
        self.repositories.user.get_or_create(uid).await
    }

    pub async fn user(&self, uid: &UserId) -> Result<UserDto, DomainError> {
        let record = self.repositories.user.find_by_id(uid).await?;
        Ok(UserDto::from(&record))
    }

    pub async fn set_threshold(&self, uid: &UserId, threshold: i64) -> Result<UserRecord, DomainError> {
        self.services
            .scheduler
            .set_threshold(uid, Some(threshold))
            .await
    }

    /// Turn forecasting off for the user.
    pub async fn clear_threshold(&self, uid: &UserId) -> Result<UserRecord, DomainError> {
        self.services.scheduler.set_threshold(uid, None).await
    }

    pub async fn set_interval(&self, uid: &UserId, minutes: i64) -> Result<UserRecord, DomainError> {
        self.services.scheduler.set_interval(uid, minutes).await
    }

    pub async fn calculate_forecast_now(&self) -> Result<ForecastResult, DomainError> {
        self.services.forecast.calculate_forecast_now().await
    }

    /// Compute a forecast and send it to the user; a failure notice goes out
    /// instead when it cannot be computed.
    #[instrument(skip(self))]
    pub async fn send_forecast_report(&self, uid: &UserId) -> Result<ForecastReportDto, DomainError> {
        match self.calculate_forecast_now().await {
            Ok(result) => {
                let report = ForecastReportDto::from(result);
                self.services
                    .notification
                    .notify(uid, &report.to_message())
                    .await;
                Ok(report)
            }
            Err(e) => {
                warn!("On-demand forecast for user {} failed: {}", uid, e);
                self.services
                    .notification
                    .notify(uid, &NotificationMessage::forecast_failed())
                    .await;
                Err(e)
            }
        }
    }

    pub async fn start_all(&self) -> Result<usize, DomainError> {
        self.services.scheduler.start_all().await
    }

    pub async fn start_health_check(&self) {
        self.services
            .scheduler
            .start_health_check_task(self.runtime.config.health_check_interval())
            .await;
    }

    pub async fn shutdown(&self) {
        self.services.scheduler.shutdown().await;
        if let Some(db) = &self.runtime.db {
            db.pool().close().await;
            info!("Database connections closed");
        }
    }
}
