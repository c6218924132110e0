use stagehand_editor::EditError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("document `{path}` is not loaded")]
    DocumentNotFound { path: PathBuf },

    #[error(transparent)]
    Edit(#[from] EditError),

    /// Formatter or disk failure. In-memory state stays valid and dirty so
    /// the caller can retry the save.
    #[error("failed to persist `{path}`: {source}")]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to load `{path}`: {source}")]
    Load {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl ProjectError {
    pub fn document_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DocumentNotFound { path: path.into() }
    }
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
    pub fn load(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Load {
            path: path.into(),
            source,
        }
    }
}

pub type ProjectResult<T> = Result<T, ProjectError>;
