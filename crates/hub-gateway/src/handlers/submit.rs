//! Submit-operation handler (`op`)

use super::{Deadline, HandlerResult};
use crate::connection::Connection;
use crate::service::HubService;
use hub_core::{Action, HubError, Message, OpType, Operation};

/// Commits an operation and fans it out
pub struct SubmitHandler;

impl SubmitHandler {
    pub async fn handle(
        service: &HubService,
        connection: &Connection,
        message: &Message,
        deadline: Deadline,
    ) -> HandlerResult<Message> {
        let op = Operation::from_message(message);
        if op.kind != OpType::Create && message.version.is_none() {
            return Err(HubError::validation("version is required").into());
        }
        let op = op.with_source(connection.id(), connection.next_sequence());

        let pipeline = service.pipeline();
        deadline
            .run(pipeline.submit(&message.collection, &message.doc_id, &op))
            .await?;
        // Committed: fan-out and the ack are no longer abandoned on timeout
        pipeline.publish(&op).await;

        tracing::debug!(
            connection_id = %connection.id(),
            collection = %message.collection,
            doc_id = %message.doc_id,
            version = op.version,
            seq = op.seq,
            "Operation accepted"
        );

        // Acknowledge with the version the operation was applied at
        Ok(Message {
            version: Some(op.version),
            ..Message::for_document(Action::Operation, &message.collection, &message.doc_id)
        })
    }
}
