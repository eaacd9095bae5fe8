//! Domain errors

mod hub_error;

pub use hub_error::{HubError, HubResult};
