//! Application error types
//!
//! Failures that stop the process from starting or serving. Per-message
//! protocol errors live in `hub_core::HubError`.

use crate::config::ConfigError;
use crate::telemetry::TracingError;

/// Process-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tracing error: {0}")]
    Tracing(#[from] TracingError),

    // Redis errors
    #[error("Cache error: {0}")]
    Cache(String),

    // Listener / transport errors
    #[error("Server error: {0}")]
    Server(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get error code for logs and exit reporting
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Tracing(_) => "TRACING_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Server(_) => "SERVER_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Process exit status for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78, // EX_CONFIG
            Self::Cache(_) => 69,  // EX_UNAVAILABLE
            Self::Tracing(_) | Self::Server(_) | Self::Internal(_) => 1,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Server(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

/// Result type alias for process-level operations
pub type AppResult<T> = Result<T, AppError>;
