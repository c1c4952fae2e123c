mod forecast_service;
mod notification_service;
mod scheduler;

pub use forecast_service::{ForecastService, Observation};
pub use notification_service::NotificationService;
pub use scheduler::{ForecastScheduler, HealthReport, ScheduleState, TickOutcome, TickReport};
