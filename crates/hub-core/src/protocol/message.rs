//! Protocol frame format
//!
//! Every frame in either direction is one JSON object of this shape.

use super::{Action, PROTOCOL_VERSION};
use crate::entities::{CreateData, Snapshot};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error descriptor carried in a response frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: u16,
    pub message: String,
}

impl ErrorInfo {
    /// Create a new error descriptor
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&crate::HubError> for ErrorInfo {
    fn from(err: &crate::HubError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

/// Protocol frame
///
/// The action is kept as the raw wire string so that unrecognised codes still
/// decode and can be answered with an error naming them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Action code
    #[serde(rename = "a", default)]
    pub action: String,

    /// Collection name
    #[serde(rename = "c", default, skip_serializing_if = "String::is_empty")]
    pub collection: String,

    /// Document id
    #[serde(rename = "d", default, skip_serializing_if = "String::is_empty")]
    pub doc_id: String,

    /// Document version
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    /// Ordered edit components, opaque to the hub
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub op: Vec<Value>,

    /// Creation payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<CreateData>,

    /// Deletion marker
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub del: bool,

    /// Generic payload (snapshot, handshake info)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Error descriptor (responses only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,

    /// Presence entries keyed by connection or user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<Map<String, Value>>,
}

impl Message {
    /// Create an empty frame for an action
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            action: action.code().to_string(),
            ..Self::default()
        }
    }

    /// Create an empty frame for an action on a document
    #[must_use]
    pub fn for_document(
        action: Action,
        collection: impl Into<String>,
        doc_id: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            doc_id: doc_id.into(),
            ..Self::new(action)
        }
    }

    // === Server Messages ===

    /// Handshake acknowledgment carrying the protocol version and connection id
    #[must_use]
    pub fn handshake(connection_id: &str) -> Self {
        Self {
            data: Some(serde_json::json!({
                "protocol": PROTOCOL_VERSION,
                "id": connection_id,
            })),
            ..Self::new(Action::Handshake)
        }
    }

    /// Fetch response carrying a snapshot
    pub fn fetched(
        collection: impl Into<String>,
        doc_id: impl Into<String>,
        snapshot: &Snapshot,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            data: Some(serde_json::to_value(snapshot)?),
            ..Self::for_document(Action::Fetch, collection, doc_id)
        })
    }

    /// Subscribe acknowledgment
    #[must_use]
    pub fn subscribed(collection: impl Into<String>, doc_id: impl Into<String>) -> Self {
        Self::for_document(Action::Subscribe, collection, doc_id)
    }

    /// Presence broadcast carrying the full presence set of a document
    #[must_use]
    pub fn presence_set(
        collection: impl Into<String>,
        doc_id: impl Into<String>,
        presence: Map<String, Value>,
    ) -> Self {
        Self {
            presence: Some(presence),
            ..Self::for_document(Action::Presence, collection, doc_id)
        }
    }

    /// Error reply echoing the request's action, collection and document id
    #[must_use]
    pub fn error_reply(request: &Self, error: ErrorInfo) -> Self {
        Self {
            action: request.action.clone(),
            collection: request.collection.clone(),
            doc_id: request.doc_id.clone(),
            error: Some(error),
            ..Self::default()
        }
    }

    // === Utilities ===

    /// Parse the action code
    #[must_use]
    pub fn parsed_action(&self) -> Option<Action> {
        Action::parse(&self.action)
    }

    /// Per-document channel name (`collection.docID`)
    #[must_use]
    pub fn document_channel(&self) -> String {
        format!("{}.{}", self.collection, self.doc_id)
    }

    /// Check if this frame carries an error
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Deserialize from raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Message(a={}", self.action)?;
        if !self.collection.is_empty() {
            write!(f, ", c={}", self.collection)?;
        }
        if !self.doc_id.is_empty() {
            write!(f, ", d={}", self.doc_id)?;
        }
        if let Some(v) = self.version {
            write!(f, ", v={v}")?;
        }
        write!(f, ")")
    }
}
