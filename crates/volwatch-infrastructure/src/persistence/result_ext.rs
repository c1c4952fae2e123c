use volwatch_domain::shared::DomainError;

/// Extension trait for Result types to simplify error handling
pub trait ResultExt<T, E> {
    /// Convert error to DomainError::Repository with context
    /// Usage: `result.map_repo_error("Failed to save user")?`
    fn map_repo_error(self, context: &str) -> Result<T, DomainError>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn map_repo_error(self, context: &str) -> Result<T, DomainError> {
        self.map_err(|e| DomainError::Repository(format!("{}: {}", context, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_repo_error() {
        let result: Result<i32, &str> = Err("disk full");
        match result.map_repo_error("Failed to save user") {
            Err(DomainError::Repository(msg)) => assert_eq!(msg, "Failed to save user: disk full"),
            _ => panic!("Expected Repository error"),
        }
    }
}
