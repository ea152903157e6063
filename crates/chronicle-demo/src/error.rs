//! Demo startup and runtime errors.

use chronicle_core::error::DomainError;
use thiserror::Error;

/// Errors that end the demo run.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable holds an invalid value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The runtime rejected a command or failed to persist or publish.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The statement could not be rendered as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_converts_and_keeps_message() {
        let err: AppError = DomainError::Validation("amount must be positive, got 0".into()).into();

        assert!(matches!(err, AppError::Domain(DomainError::Validation(_))));
        assert_eq!(
            err.to_string(),
            "domain error: validation error: amount must be positive, got 0"
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = AppError::Config("LOG_FORMAT must be json or pretty, got xml".into());

        assert_eq!(
            err.to_string(),
            "configuration error: LOG_FORMAT must be json or pretty, got xml"
        );
    }
}
