use serde::{Deserialize, Serialize};

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Resource Not Found (2xxx)
    UserNotFound = 2001,

    // Forecasting (3xxx)
    ProviderUnavailable = 3001,
    IndeterminateForecast = 3002,

    // Data & Persistence (4xxx)
    RepositoryError = 4001,
    SerializationError = 4004,

    // Infrastructure (5xxx)
    InfrastructureError = 5001,
    NotificationError = 5002,
    ConfigurationError = 5003,

    // Validation (6xxx)
    ValidationError = 6001,
    InvalidInput = 6002,
}

impl ErrorCode {
    /// Get error code as integer
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorCode::ProviderUnavailable
            | ErrorCode::IndeterminateForecast
            | ErrorCode::NotificationError => ErrorSeverity::Warning,

            ErrorCode::ValidationError | ErrorCode::InvalidInput => ErrorSeverity::Info,

            ErrorCode::UserNotFound
            | ErrorCode::RepositoryError
            | ErrorCode::SerializationError
            | ErrorCode::InfrastructureError => ErrorSeverity::Error,

            ErrorCode::ConfigurationError => ErrorSeverity::Critical,
        }
    }

    /// Recoverable errors are handled inside a tick; the next tick proceeds normally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCode::ProviderUnavailable
                | ErrorCode::IndeterminateForecast
                | ErrorCode::NotificationError
        )
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Indicator provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Indeterminate forecast: {0}")]
    IndeterminateForecast(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl DomainError {
    /// Get error code
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::ProviderUnavailable(_) => ErrorCode::ProviderUnavailable,
            DomainError::IndeterminateForecast(_) => ErrorCode::IndeterminateForecast,
            DomainError::NotFound(_) => ErrorCode::UserNotFound,
            DomainError::Repository(_) => ErrorCode::RepositoryError,
            DomainError::Notification(_) => ErrorCode::NotificationError,
            DomainError::Infrastructure(_) => ErrorCode::InfrastructureError,
            DomainError::Configuration(_) => ErrorCode::ConfigurationError,
            DomainError::Validation(_) => ErrorCode::ValidationError,
            DomainError::InvalidInput(_) => ErrorCode::InvalidInput,
            DomainError::Serialization(_) => ErrorCode::SerializationError,
            DomainError::Deserialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }

    /// Format error with code
    pub fn format_with_code(&self) -> String {
        format!("[{}] {}", self.code().code(), self)
    }
}
