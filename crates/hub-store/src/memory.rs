//! In-process snapshot store with optimistic version checks

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hub_core::{Adapter, HubError, HubResult, OpType, Operation, QueryOptions, Snapshot};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// One document and the time of its last commit
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub snapshot: Snapshot,
    pub updated_at: DateTime<Utc>,
}

/// `Adapter` keeping documents in a concurrent map keyed by `collection.docID`
///
/// Commits are serialized per document by the map's entry lock, so two
/// writers racing on the same version see exactly one success.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    docs: DashMap<String, StoredDocument>,
    closed: AtomicBool,
}

fn key(collection: &str, doc_id: &str) -> String {
    format!("{collection}.{doc_id}")
}

impl MemoryAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document snapshot, replacing any existing one
    pub fn insert_snapshot(&self, collection: &str, snapshot: Snapshot) {
        self.docs.insert(
            key(collection, &snapshot.id),
            StoredDocument {
                snapshot,
                updated_at: Utc::now(),
            },
        );
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn ensure_open(&self) -> HubResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HubError::Storage("adapter is closed".to_string()));
        }
        Ok(())
    }
}

fn check_version(op: &Operation, current: &Snapshot) -> HubResult<()> {
    if op.version != current.version {
        return Err(HubError::VersionConflict {
            submitted: op.version,
            current: current.version,
        });
    }
    Ok(())
}

/// Apply a committed operation to a snapshot
///
/// Edit components are opaque here; the snapshot keeps its data and the
/// operation log carries the edit.
fn apply(snapshot: &mut Snapshot, op: &Operation) {
    match op.kind {
        OpType::Create => {
            if let Some(create) = &op.create {
                snapshot.type_name = Some(create.type_name.clone());
                snapshot.data = create.data.clone();
            }
        }
        OpType::Delete => {
            snapshot.type_name = None;
            snapshot.data = Value::Null;
        }
        OpType::Edit => {}
    }
    snapshot.version += 1;
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn get_snapshot(
        &self,
        collection: &str,
        doc_id: &str,
        _options: Option<&QueryOptions>,
    ) -> HubResult<Snapshot> {
        self.ensure_open()?;
        self.docs
            .get(&key(collection, doc_id))
            .map(|doc| doc.snapshot.clone())
            .ok_or_else(|| HubError::not_found(collection, doc_id))
    }

    async fn commit(&self, collection: &str, doc_id: &str, op: &Operation) -> HubResult<Snapshot> {
        self.ensure_open()?;

        let snapshot = match self.docs.entry(key(collection, doc_id)) {
            Entry::Vacant(slot) => {
                if op.kind != OpType::Create {
                    return Err(HubError::not_found(collection, doc_id));
                }
                let mut snapshot = Snapshot::empty(doc_id);
                check_version(op, &snapshot)?;
                apply(&mut snapshot, op);
                slot.insert(StoredDocument {
                    snapshot: snapshot.clone(),
                    updated_at: Utc::now(),
                });
                snapshot
            }
            Entry::Occupied(mut slot) => {
                let doc = slot.get_mut();
                match op.kind {
                    OpType::Create if doc.snapshot.exists() => {
                        return Err(HubError::DocumentExists {
                            collection: collection.to_string(),
                            doc_id: doc_id.to_string(),
                        });
                    }
                    OpType::Edit | OpType::Delete if !doc.snapshot.exists() => {
                        return Err(HubError::not_found(collection, doc_id));
                    }
                    _ => {}
                }
                check_version(op, &doc.snapshot)?;
                apply(&mut doc.snapshot, op);
                doc.updated_at = Utc::now();
                doc.snapshot.clone()
            }
        };

        tracing::debug!(
            collection = %collection,
            doc_id = %doc_id,
            op_type = %op.kind,
            version = snapshot.version,
            "Committed operation"
        );
        Ok(snapshot)
    }

    async fn close(&self) -> HubResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
