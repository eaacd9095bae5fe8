//! Domain entities

mod collection;
mod operation;
mod presence;
mod snapshot;

pub use collection::{CollectionInfo, DocumentType};
pub use operation::{CreateData, OpType, Operation};
pub use presence::PresenceData;
pub use snapshot::{QueryOptions, Snapshot};
