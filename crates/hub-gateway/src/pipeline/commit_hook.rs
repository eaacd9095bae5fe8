//! Commit hook that records each commit as a structured log event

use async_trait::async_trait;
use hub_core::{CommitHook, HubResult, Operation};

/// Emits one `info` event per committed operation
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCommitHook;

#[async_trait]
impl CommitHook for TracingCommitHook {
    async fn after_commit(&self, collection: &str, doc_id: &str, op: &Operation) -> HubResult<()> {
        tracing::info!(
            collection = %collection,
            doc_id = %doc_id,
            op_type = %op.kind,
            version = op.version,
            source = %op.source,
            seq = op.seq,
            components = op.op.len(),
            "Operation committed"
        );
        Ok(())
    }
}
