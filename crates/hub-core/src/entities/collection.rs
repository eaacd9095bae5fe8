//! Collection name classification
//!
//! Collection names encode what kind of document they hold through a short
//! prefix: `rec_<tableId>`, `fld_<tableId>`, `viw_<tableId>`, `tbl_<baseId>`.
//! A `/` suffix may carry the document id (`rec_tbl1/rec1`).

use serde::{Deserialize, Serialize};

const RECORD_PREFIX: &str = "rec_";
const FIELD_PREFIX: &str = "fld_";
const VIEW_PREFIX: &str = "viw_";
const TABLE_PREFIX: &str = "tbl_";

/// Kind of document held by a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Record,
    Field,
    View,
    Table,
}

impl DocumentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Field => "field",
            Self::View => "view",
            Self::Table => "table",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed classification of a collection name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub doc_type: DocumentType,
    /// Owning table id (the base id for table collections)
    pub table_id: String,
    /// Document id when embedded in the name
    pub document_id: Option<String>,
}

impl CollectionInfo {
    /// Classify a collection name
    ///
    /// Names without a known prefix classify as [`DocumentType::Table`] with the
    /// whole name as the table id.
    #[must_use]
    pub fn parse(collection: &str) -> Self {
        let (head, document_id) = match collection.split_once('/') {
            Some((head, doc)) if !doc.is_empty() => (head, Some(doc.to_string())),
            Some((head, _)) => (head, None),
            None => (collection, None),
        };

        let (doc_type, table_id) = [
            (RECORD_PREFIX, DocumentType::Record),
            (FIELD_PREFIX, DocumentType::Field),
            (VIEW_PREFIX, DocumentType::View),
            (TABLE_PREFIX, DocumentType::Table),
        ]
        .into_iter()
        .find_map(|(prefix, doc_type)| head.strip_prefix(prefix).map(|rest| (doc_type, rest)))
        .unwrap_or((DocumentType::Table, head));

        Self {
            doc_type,
            table_id: table_id.to_string(),
            document_id,
        }
    }

    /// Check if operations may be committed to this collection
    #[must_use]
    pub fn is_record(&self) -> bool {
        self.doc_type == DocumentType::Record
    }
}
