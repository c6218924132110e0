//! # Stagehand Inference
//!
//! Turns a component's declared parameter type into a portable prop schema
//! the editor frontend can render controls from. Resolution crosses files
//! through the [`DocumentStore`] seam; the engine itself never touches the
//! filesystem and never fails. Anything it cannot interpret degrades to
//! an empty schema or an `unhandled` descriptor.

pub mod engine;
pub mod store;
pub mod types;

pub use engine::{resolve_export, InferenceEngine};
pub use store::{resolve_module, DocumentStore};
pub use types::{LiteralValue, PropDescriptor, PropKind, PropSchema, Transforms, ValueKind};
