use serde::{Deserialize, Serialize};

use volwatch_domain::forecast::ForecastResult;
use volwatch_domain::notification::{NotificationKind, NotificationMessage};
use volwatch_domain::user::UserRecord;

/// On-demand forecast, as shown to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastReportDto {
    /// RFC 2822, UTC
    pub date: String,
    pub forecast: i64,
    pub current_value: i64,
}

impl ForecastReportDto {
    /// `*bold*` text in the same style as threshold notifications
    pub fn to_markdown(&self) -> String {
        format!(
            "Date: *{}*\nForecast: *{}* BTC\nCurrent volume: *{}* BTC",
            self.date, self.forecast, self.current_value
        )
    }

    pub fn to_message(&self) -> NotificationMessage {
        NotificationMessage::new(NotificationKind::ForecastReport, self.to_markdown())
    }
}

impl From<ForecastResult> for ForecastReportDto {
    fn from(result: ForecastResult) -> Self {
        Self {
            date: result.observed_at.to_rfc2822(),
            forecast: result.forecast,
            current_value: result.current_value,
        }
    }
}

/// User settings and last observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub uid: String,
    pub interval: Option<u32>,
    pub threshold: Option<i64>,
    pub latest_forecast: Option<i64>,
    pub current_value: Option<i64>,
    pub forecast_exceeded_notified_at: Option<String>,
    pub volume_exceeded_notified_at: Option<String>,
}

impl From<&UserRecord> for UserDto {
    fn from(record: &UserRecord) -> Self {
        Self {
            uid: record.uid().to_string(),
            interval: record.interval(),
            threshold: record.threshold(),
            latest_forecast: record.latest_forecast(),
            current_value: record.current_value(),
            forecast_exceeded_notified_at: record
                .forecast_exceeded_notified_at()
                .map(|t| t.to_rfc3339()),
            volume_exceeded_notified_at: record
                .volume_exceeded_notified_at()
                .map(|t| t.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_report_markdown() {
        let report = ForecastReportDto::from(ForecastResult {
            observed_at: Utc.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap(),
            forecast: 999,
            current_value: 500,
        });

        assert_eq!(
            report.to_markdown(),
            "Date: *Mon, 15 Jun 2020 12:00:00 +0000*\nForecast: *999* BTC\nCurrent volume: *500* BTC"
        );
        assert_eq!(report.to_message().kind, NotificationKind::ForecastReport);
    }
}
