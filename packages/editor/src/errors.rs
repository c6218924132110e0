use stagehand_parser::ParseError;
use thiserror::Error;

/// Errors surfaced by document edits and index queries.
///
/// "Not found" variants are hard errors: the caller held a stale position
/// and must re-query. Unresolvable types are never an error; inference
/// degrades to an empty schema instead.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("no element at {line}:{column}")]
    ElementNotFound { line: u32, column: u32 },

    #[error("no deleted element at {line}:{column}")]
    DeletedElementNotFound { line: u32, column: u32 },

    #[error("export `{name}` not found")]
    ExportNotFound { name: String },

    #[error("declaration `{name}` not found")]
    DeclarationNotFound { name: String },

    #[error("export `{name}` has no element root")]
    MissingRoot { name: String },

    #[error("`{name}` resolves to more than one declaration")]
    AmbiguousResolution { name: String },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl EditError {
    pub fn element_not_found(line: u32, column: u32) -> Self {
        Self::ElementNotFound { line, column }
    }
    pub fn deleted_element_not_found(line: u32, column: u32) -> Self {
        Self::DeletedElementNotFound { line, column }
    }
    pub fn export_not_found(name: &str) -> Self {
        Self::ExportNotFound {
            name: name.to_string(),
        }
    }
    pub fn declaration_not_found(name: &str) -> Self {
        Self::DeclarationNotFound {
            name: name.to_string(),
        }
    }
    pub fn missing_root(name: &str) -> Self {
        Self::MissingRoot {
            name: name.to_string(),
        }
    }
    pub fn ambiguous(name: &str) -> Self {
        Self::AmbiguousResolution {
            name: name.to_string(),
        }
    }
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}

pub type EditResult<T> = Result<T, EditError>;
