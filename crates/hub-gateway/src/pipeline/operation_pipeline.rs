//! Operation pipeline
//!
//! Commits an operation through the adapter, then fans it out to the
//! collection channel and the document channel.

use super::DocumentRegistry;
use hub_core::{Adapter, CommitHook, HubResult, Operation, PubSub, Snapshot};
use std::sync::Arc;

/// Commit-then-publish path for submitted operations
#[derive(Clone)]
pub struct OperationPipeline {
    adapter: Arc<dyn Adapter>,
    pubsub: Arc<dyn PubSub>,
    documents: Arc<DocumentRegistry>,
    hook: Option<Arc<dyn CommitHook>>,
}

impl OperationPipeline {
    pub fn new(
        adapter: Arc<dyn Adapter>,
        pubsub: Arc<dyn PubSub>,
        documents: Arc<DocumentRegistry>,
        hook: Option<Arc<dyn CommitHook>>,
    ) -> Self {
        Self {
            adapter,
            pubsub,
            documents,
            hook,
        }
    }

    /// Commit an operation
    ///
    /// Adapter failures (stale version, missing document) propagate. The
    /// commit hook runs on its own task; its failures are logged and never
    /// reach the submitter.
    pub async fn submit(&self, collection: &str, doc_id: &str, op: &Operation) -> HubResult<Snapshot> {
        let snapshot = self.adapter.commit(collection, doc_id, op).await?;
        self.documents.record(collection, doc_id, snapshot.version);

        if let Some(hook) = &self.hook {
            let hook = Arc::clone(hook);
            let collection = collection.to_string();
            let doc_id = doc_id.to_string();
            let op = op.clone();
            tokio::spawn(async move {
                if let Err(e) = hook.after_commit(&collection, &doc_id, &op).await {
                    tracing::warn!(
                        collection = %collection,
                        doc_id = %doc_id,
                        error = %e,
                        "Commit hook failed"
                    );
                }
            });
        }

        Ok(snapshot)
    }

    /// Publish a committed operation to its collection and document channels
    ///
    /// Each channel is attempted independently; failures are logged and
    /// never reach the caller.
    pub async fn publish(&self, op: &Operation) {
        for channel in op.channels() {
            if let Err(e) = self.pubsub.publish(std::slice::from_ref(&channel), op).await {
                tracing::warn!(
                    channel = %channel,
                    version = op.version,
                    error = %e,
                    "Failed to publish operation"
                );
            }
        }
    }
}

impl std::fmt::Debug for OperationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationPipeline")
            .field("documents", &self.documents.count())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
