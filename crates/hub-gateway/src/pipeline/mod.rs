//! Operation commit and fan-out

mod commit_hook;
mod document_registry;
mod operation_pipeline;

pub use commit_hook::TracingCommitHook;
pub use document_registry::{DocumentEntry, DocumentRegistry};
pub use operation_pipeline::OperationPipeline;
