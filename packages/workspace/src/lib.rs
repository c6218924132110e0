//! # Stagehand Workspace
//!
//! The project manager: owns the set of loaded documents, the inference
//! engine, the filesystem watcher and the change feeds. This is the
//! surface the transport layer and frontend talk to; everything below it
//! (parsing, indexing, mutations, inference) lives in the lower crates.

pub mod errors;
pub mod formatter;
pub mod project;
pub mod subscription;
pub mod watcher;

pub use errors::{ProjectError, ProjectResult};
pub use formatter::{Formatter, PassthroughFormatter};
pub use project::Project;
pub use subscription::Subscription;
pub use watcher::FileWatcher;
