//! Handler error types

use hub_core::{ErrorInfo, HubError};
use std::time::Duration;
use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Protocol-visible failure, answered with an error frame
    #[error(transparent)]
    Hub(#[from] HubError),

    /// The handler missed its deadline
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The outbound queue is gone; the connection is being torn down
    #[error("Connection closed")]
    ConnectionClosed,
}

impl HandlerError {
    /// Error descriptor for the response frame, if one should be sent
    pub fn to_error_info(&self) -> Option<ErrorInfo> {
        match self {
            Self::Hub(e) => Some(ErrorInfo::from(e)),
            Self::Timeout(_) => Some(ErrorInfo::new(504, self.to_string())),
            Self::ConnectionClosed => None,
        }
    }

    /// Check if this error ends the connection
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectionClosed)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Hub(HubError::Serialization(err))
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
