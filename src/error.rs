//! Application-wide error types.

use thiserror::Error;

use crate::llm::ProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Empty, oversized or blocklisted input. Never reaches the model.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("rate limit exceeded: at most {limit} requests per {window_secs}s")]
    RateLimitExceeded { limit: usize, window_secs: u64 },

    /// The model call failed or timed out.
    #[error("external service error: {0}")]
    ExternalService(String),
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::ExternalService(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(e.to_string().contains("config error"));
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn rate_limit_display_names_window() {
        let e = AppError::RateLimitExceeded { limit: 10, window_secs: 60 };
        assert_eq!(e.to_string(), "rate limit exceeded: at most 10 requests per 60s");
    }

    #[test]
    fn provider_error_becomes_external_service() {
        let e: AppError = ProviderError::Request("HTTP 500".into()).into();
        assert!(matches!(e, AppError::ExternalService(ref m) if m.contains("HTTP 500")));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        let _: &dyn Error = &e;
    }
}
