//! Presence handler (`p`)

use super::HandlerResult;
use crate::connection::Connection;
use crate::service::HubService;
use hub_core::{Message, PresenceData};

/// Stores the connection's presence and answers with the document's full set
pub struct PresenceHandler;

impl PresenceHandler {
    pub async fn handle(
        service: &HubService,
        connection: &Connection,
        message: &Message,
    ) -> HandlerResult<Message> {
        let channel = message.document_channel();
        let data = PresenceData::new(
            connection.user_id(),
            message.presence.clone().unwrap_or_default(),
        );

        let presences = service
            .presence()
            .submit(&channel, connection.id(), data)
            .await?;
        connection.track_presence(&channel);

        tracing::trace!(
            connection_id = %connection.id(),
            channel = %channel,
            entries = presences.len(),
            "Presence updated"
        );

        Ok(Message::presence_set(
            &message.collection,
            &message.doc_id,
            presences,
        ))
    }
}
