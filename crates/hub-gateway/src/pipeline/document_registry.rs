//! Registry of documents that have committed through this instance

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Commit bookkeeping for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub collection: String,
    pub doc_id: String,
    /// Version after the most recent commit
    pub version: i64,
    pub commits: u64,
    pub first_commit: DateTime<Utc>,
    pub last_commit: DateTime<Utc>,
}

/// Documents keyed by `collection.docID`
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: DashMap<String, DocumentEntry>,
}

impl DocumentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful commit
    ///
    /// Commits to one document may finish out of order; the recorded version
    /// never moves backwards.
    pub fn record(&self, collection: &str, doc_id: &str, version: i64) {
        let now = Utc::now();
        self.documents
            .entry(format!("{collection}.{doc_id}"))
            .and_modify(|entry| {
                entry.version = entry.version.max(version);
                entry.commits += 1;
                entry.last_commit = now;
            })
            .or_insert_with(|| DocumentEntry {
                collection: collection.to_string(),
                doc_id: doc_id.to_string(),
                version,
                commits: 1,
                first_commit: now,
                last_commit: now,
            });
    }

    pub fn get(&self, collection: &str, doc_id: &str) -> Option<DocumentEntry> {
        self.documents
            .get(&format!("{collection}.{doc_id}"))
            .map(|entry| entry.clone())
    }

    pub fn count(&self) -> usize {
        self.documents.len()
    }
}
