//! Operation submissions are only accepted on record collections

use super::Middleware;
use crate::connection::Connection;
use async_trait::async_trait;
use hub_core::{Action, CollectionInfo, HubError, HubResult, Message};
use tokio_util::sync::CancellationToken;

/// Rejects `op` messages whose collection does not classify as a record
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordOnlySubmit;

#[async_trait]
impl Middleware for RecordOnlySubmit {
    fn name(&self) -> &'static str {
        "record_only_submit"
    }

    async fn handle(
        &self,
        _scope: &CancellationToken,
        connection: &Connection,
        message: &Message,
    ) -> HubResult<()> {
        // Empty collections are left to the handler's own validation
        if message.parsed_action() != Some(Action::Operation) || message.collection.is_empty() {
            return Ok(());
        }

        let info = CollectionInfo::parse(&message.collection);
        if !info.is_record() {
            tracing::warn!(
                connection_id = %connection.id(),
                user_id = %connection.user_id(),
                collection = %message.collection,
                doc_type = %info.doc_type,
                "Rejected operation on non-record collection"
            );
            return Err(HubError::rejected("only record op can be committed"));
        }

        tracing::debug!(
            connection_id = %connection.id(),
            collection = %message.collection,
            doc_id = %message.doc_id,
            "Operation validated"
        );
        Ok(())
    }
}
