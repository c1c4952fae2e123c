use std::time::Duration;

/// Timeouts applied to I/O that can stall a user's tick cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Indicator provider HTTP request timeout
    pub http_request: Duration,

    /// Notification delivery timeout
    pub notification: Duration,

    /// SQLite connection acquire timeout
    pub db_acquire: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            http_request: Duration::from_secs(30),
            notification: Duration::from_secs(15),
            db_acquire: Duration::from_secs(10),
        }
    }
}

impl TimeoutConfig {
    pub fn with_http_request(mut self, timeout: Duration) -> Self {
        self.http_request = timeout;
        self
    }
}
