//! Operations - committed mutations relayed to subscribers

use crate::protocol::{Action, Message};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Create,
    Edit,
    Delete,
}

impl OpType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for OpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creation payload: a type tag and the initial document data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateData {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub data: Value,
}

impl CreateData {
    pub fn new(type_name: impl Into<String>, data: Value) -> Self {
        Self {
            type_name: type_name.into(),
            data,
        }
    }
}

/// A mutation submitted against a document version
///
/// This is also the payload format on the broker, so every field has a stable
/// wire name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OpType,

    /// Ordered edit components, never inspected by the hub
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub op: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<CreateData>,

    /// Version the operation was submitted against
    #[serde(rename = "v")]
    pub version: i64,

    /// Originating connection id
    #[serde(rename = "src", default)]
    pub source: String,

    /// Per-connection sequence number
    #[serde(default)]
    pub seq: u64,

    #[serde(rename = "c", default, skip_serializing_if = "String::is_empty")]
    pub collection: String,

    #[serde(rename = "d", default, skip_serializing_if = "String::is_empty")]
    pub doc_id: String,
}

impl Operation {
    /// Create an edit operation
    pub fn edit(
        collection: impl Into<String>,
        doc_id: impl Into<String>,
        version: i64,
        op: Vec<Value>,
    ) -> Self {
        Self {
            kind: OpType::Edit,
            op,
            create: None,
            version,
            source: String::new(),
            seq: 0,
            collection: collection.into(),
            doc_id: doc_id.into(),
        }
    }

    /// Create a creation operation
    pub fn create(
        collection: impl Into<String>,
        doc_id: impl Into<String>,
        create: CreateData,
    ) -> Self {
        Self {
            kind: OpType::Create,
            create: Some(create),
            ..Self::edit(collection, doc_id, 0, Vec::new())
        }
    }

    /// Create a deletion operation
    pub fn delete(collection: impl Into<String>, doc_id: impl Into<String>, version: i64) -> Self {
        Self {
            kind: OpType::Delete,
            ..Self::edit(collection, doc_id, version, Vec::new())
        }
    }

    /// Stamp the originating connection and its sequence number
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>, seq: u64) -> Self {
        self.source = source.into();
        self.seq = seq;
        self
    }

    /// Key of the target document (`collection.docID`)
    pub fn document_key(&self) -> String {
        format!("{}.{}", self.collection, self.doc_id)
    }

    /// Fan-out channels: the whole collection, then the single document
    pub fn channels(&self) -> [String; 2] {
        [self.collection.clone(), self.document_key()]
    }

    /// Encode as an `op` frame for delivery to subscribers
    pub fn to_message(&self) -> Message {
        Message {
            version: Some(self.version),
            op: self.op.clone(),
            create: self.create.clone(),
            del: self.kind == OpType::Delete,
            ..Message::for_document(Action::Operation, &self.collection, &self.doc_id)
        }
    }

    /// Decode an `op` frame
    ///
    /// The kind is inferred from the frame: a creation payload means create,
    /// the `del` marker means delete, anything else is an edit.
    pub fn from_message(message: &Message) -> Self {
        let kind = if message.create.is_some() {
            OpType::Create
        } else if message.del {
            OpType::Delete
        } else {
            OpType::Edit
        };

        Self {
            kind,
            op: message.op.clone(),
            create: message.create.clone(),
            version: message.version.unwrap_or_default(),
            source: String::new(),
            seq: 0,
            collection: message.collection.clone(),
            doc_id: message.doc_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_op_frame_shape() {
        let op = Operation::edit("tbl1", "rec1", 5, vec![json!({"p": ["name"], "oi": "x"})]);
        let value = serde_json::to_value(op.to_message()).unwrap();

        assert_eq!(
            value,
            json!({"a": "op", "c": "tbl1", "d": "rec1", "v": 5, "op": [{"p": ["name"], "oi": "x"}]})
        );
    }

    #[test]
    fn test_message_roundtrip_preserves_edit() {
        let op = Operation::edit("rec_tbl1", "rec1", 7, vec![json!({"p": [0], "si": "a"})]);
        let decoded = Operation::from_message(&op.to_message());

        assert_eq!(decoded.kind, OpType::Edit);
        assert_eq!(decoded.op, op.op);
        assert_eq!(decoded.version, 7);
        assert_eq!(decoded.collection, "rec_tbl1");
        assert_eq!(decoded.doc_id, "rec1");
    }

    #[test]
    fn test_message_roundtrip_preserves_create_and_delete() {
        let create = Operation::create("rec_tbl1", "rec2", CreateData::new("json0", json!({"a": 1})));
        let decoded = Operation::from_message(&create.to_message());
        assert_eq!(decoded.kind, OpType::Create);
        assert_eq!(decoded.create, create.create);

        let delete = Operation::delete("rec_tbl1", "rec2", 3);
        let decoded = Operation::from_message(&delete.to_message());
        assert_eq!(decoded.kind, OpType::Delete);
        assert_eq!(decoded.version, 3);
    }

    #[test]
    fn test_broker_payload_shape() {
        let op = Operation::edit("tbl1", "rec1", 2, vec![json!({"p": [1]})]).with_source("conn_a", 4);
        let value = serde_json::to_value(&op).unwrap();

        assert_eq!(value["type"], "edit");
        assert_eq!(value["v"], 2);
        assert_eq!(value["src"], "conn_a");
        assert_eq!(value["seq"], 4);
        assert_eq!(value["c"], "tbl1");
        assert_eq!(value["d"], "rec1");

        let parsed: Operation = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, op);
    }

    #[test]
    fn test_channels() {
        let op = Operation::edit("tbl1", "rec1", 0, Vec::new());
        assert_eq!(op.channels(), ["tbl1".to_string(), "tbl1.rec1".to_string()]);
    }
}
