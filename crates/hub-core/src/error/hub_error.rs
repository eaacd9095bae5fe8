//! Hub errors - failures that surface to clients as protocol error frames

use thiserror::Error;

/// Errors produced while handling a protocol message
///
/// Every variant maps to a numeric wire code through [`HubError::code`], which is
/// what the client sees in the `error` field of the response frame.
#[derive(Debug, Error)]
pub enum HubError {
    // =========================================================================
    // Client Errors
    // =========================================================================
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Document not found: {collection}.{doc_id}")]
    DocumentNotFound { collection: String, doc_id: String },

    #[error("Document already exists: {collection}.{doc_id}")]
    DocumentExists { collection: String, doc_id: String },

    #[error("Version conflict: submitted {submitted}, current {current}")]
    VersionConflict { submitted: i64, current: i64 },

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Pub/Sub error: {0}")]
    PubSub(String),

    #[error("Presence error: {0}")]
    Presence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Build a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a middleware rejection
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Build a not-found error for a document
    pub fn not_found(collection: impl Into<String>, doc_id: impl Into<String>) -> Self {
        Self::DocumentNotFound {
            collection: collection.into(),
            doc_id: doc_id.into(),
        }
    }

    /// Numeric code carried in the error frame
    pub fn code(&self) -> u16 {
        match self {
            Self::UnknownAction(_) | Self::Validation(_) => 400,
            Self::Rejected(_) => 403,
            Self::DocumentNotFound { .. } => 404,
            Self::DocumentExists { .. } | Self::VersionConflict { .. } => 409,
            Self::Storage(_)
            | Self::PubSub(_)
            | Self::Presence(_)
            | Self::Serialization(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DocumentNotFound { .. })
    }

    /// Check if this is a version or existence conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DocumentExists { .. } | Self::VersionConflict { .. })
    }
}

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;
