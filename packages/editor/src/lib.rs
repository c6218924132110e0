//! # Stagehand Editor
//!
//! The live source model for one document: parsed tree, position-addressed
//! element index, structural mutations, soft-delete pragma codec and the
//! per-document revision log. The source text is the single source of
//! truth; mutations splice text and reparse, and a transaction either
//! fully applies or leaves the document untouched.

pub mod document;
pub mod element_index;
pub mod errors;
pub mod mutations;
pub mod pragma;
pub mod revision_log;

pub use document::{Document, EditBuffer};
pub use element_index::{locate, lookup, lookup_id, ElementClass, ElementPositionNode};
pub use errors::{EditError, EditResult};
pub use mutations::{format_attr_value, MovePlacement, NewElement, NewElementKind};
pub use revision_log::{EditOutcome, Revision, RevisionKind, RevisionLog, TravelOutcome};
