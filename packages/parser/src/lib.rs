//! # Stagehand Parser
//!
//! Parses scene component source files into a span-carrying AST.
//!
//! The editor's source of truth is the source text itself; the AST exists to
//! locate things inside it. Every node records byte spans, JSX elements live
//! in an arena of id-linked nodes, and constructs the editor never rewrites
//! are kept as opaque spans rather than parsed structure.

pub mod ast;
pub mod error;
pub mod parser;
pub mod position;
pub mod tokenizer;

pub use ast::SceneDocument;
pub use error::{ParseError, ParseResult};
pub use parser::{parse, parse_doc_comment, Parser, DELETED_PRAGMA_PREFIX};
pub use position::PositionMap;
pub use tokenizer::{tokenize, Token};
