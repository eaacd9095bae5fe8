//! Action handlers
//!
//! Routes each inbound message to the handler for its action code.

mod deadline;
mod error;
mod fetch;
mod handshake;
mod presence;
mod submit;
mod subscribe;

pub use deadline::Deadline;
pub use error::{HandlerError, HandlerResult};
pub use fetch::FetchHandler;
pub use handshake::HandshakeHandler;
pub use presence::PresenceHandler;
pub use submit::SubmitHandler;
pub use subscribe::SubscribeHandler;

use crate::connection::Connection;
use crate::service::HubService;
use hub_core::{Action, HubError, HubResult, Message};
use std::sync::Arc;

/// Dispatch incoming client messages to appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle an incoming client message, returning the response frame
    ///
    /// Middleware runs first, in registration order. Any error here is
    /// answered with an error frame by the caller. Everything up to a commit
    /// runs under `deadline`; fan-out of a committed operation does not.
    pub async fn dispatch(
        service: &HubService,
        connection: &Arc<Connection>,
        message: &Message,
        deadline: Deadline,
    ) -> HandlerResult<Message> {
        deadline
            .run(service.middleware().run(service.scope(), connection, message))
            .await?;

        let Some(action) = message.parsed_action() else {
            tracing::debug!(
                connection_id = %connection.id(),
                action = %message.action,
                "Unknown action"
            );
            return Err(HubError::UnknownAction(message.action.clone()).into());
        };

        if action.targets_document() {
            require_target(action, message)?;
        }

        match action {
            Action::Handshake => Ok(HandshakeHandler::handle(connection)),
            Action::Fetch => deadline.run(FetchHandler::handle(service, message)).await,
            Action::Subscribe => {
                deadline
                    .run(SubscribeHandler::handle(service, connection, message))
                    .await
            }
            Action::Operation => SubmitHandler::handle(service, connection, message, deadline).await,
            Action::Presence => {
                deadline
                    .run(PresenceHandler::handle(service, connection, message))
                    .await
            }
        }
    }
}

/// Document-targeting actions need a collection, and all but a
/// collection-wide subscribe need a document id
fn require_target(action: Action, message: &Message) -> HubResult<()> {
    if message.collection.is_empty() {
        return Err(HubError::validation("collection is required"));
    }
    if message.doc_id.is_empty() && action != Action::Subscribe {
        return Err(HubError::validation("document id is required"));
    }
    Ok(())
}
