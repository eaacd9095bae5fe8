//! Pre-dispatch middleware
//!
//! Validators run in registration order before a message reaches its
//! handler. The first rejection short-circuits dispatch.

mod chain;
mod record_only;

pub use chain::{Middleware, MiddlewareChain};
pub use record_only::RecordOnlySubmit;
