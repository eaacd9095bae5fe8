//! Subscribe handler (`s`)

use super::HandlerResult;
use crate::connection::Connection;
use crate::service::HubService;
use hub_core::{HandlerFuture, Message, Operation, OperationHandler};
use std::sync::Arc;

/// Subscribes a connection to a document (or a whole collection when the
/// document id is empty) and forwards every published operation to it
pub struct SubscribeHandler;

impl SubscribeHandler {
    pub async fn handle(
        service: &HubService,
        connection: &Arc<Connection>,
        message: &Message,
    ) -> HandlerResult<Message> {
        let channel = if message.doc_id.is_empty() {
            message.collection.clone()
        } else {
            message.document_channel()
        };

        if connection.is_subscribed(&channel) {
            tracing::debug!(
                connection_id = %connection.id(),
                channel = %channel,
                "Already subscribed"
            );
            return Ok(Message::subscribed(&message.collection, &message.doc_id));
        }

        let target = Arc::clone(connection);
        let forward: OperationHandler = Arc::new(move |op: Operation| -> HandlerFuture {
            let target = Arc::clone(&target);
            Box::pin(async move { target.deliver(op.to_message()).await })
        });

        let subscription = service
            .pubsub()
            .subscribe(service.scope(), &channel, forward)
            .await?;
        connection.track_subscription(subscription);

        tracing::debug!(
            connection_id = %connection.id(),
            channel = %channel,
            "Subscribed"
        );

        Ok(Message::subscribed(&message.collection, &message.doc_id))
    }
}
