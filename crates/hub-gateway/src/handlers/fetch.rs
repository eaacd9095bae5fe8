//! Fetch handler (`f`)

use super::HandlerResult;
use crate::service::HubService;
use hub_core::Message;

/// Reads the current snapshot of a document
pub struct FetchHandler;

impl FetchHandler {
    pub async fn handle(service: &HubService, message: &Message) -> HandlerResult<Message> {
        let snapshot = service
            .adapter()
            .get_snapshot(&message.collection, &message.doc_id, None)
            .await?;

        tracing::debug!(
            collection = %message.collection,
            doc_id = %message.doc_id,
            version = snapshot.version,
            "Fetched snapshot"
        );

        Ok(Message::fetched(&message.collection, &message.doc_id, &snapshot)?)
    }
}
