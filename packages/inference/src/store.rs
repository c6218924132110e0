//! Cross-document resolution seam.
//!
//! The engine never owns documents; whoever calls it supplies parsed
//! documents through this trait. Keeping the lookup behind a trait means
//! no global registries and no filesystem access from inference itself.

use stagehand_parser::SceneDocument;
use std::path::{Component, Path, PathBuf};

/// Read access to parsed documents, keyed by project path.
pub trait DocumentStore {
    fn document(&self, path: &Path) -> Option<&SceneDocument>;
}

/// Resolve an import specifier against the importing file's path.
///
/// Relative specifiers resolve to project files (with `.tsx` appended when
/// the specifier has no extension). Bare specifiers live in dependency
/// storage outside the project and resolve to `None`.
pub fn resolve_module(importer: &Path, specifier: &str) -> Option<PathBuf> {
    if !specifier.starts_with('.') {
        return None;
    }

    let base = importer.parent().unwrap_or_else(|| Path::new(""));
    let joined = base.join(specifier);

    // Normalize `.` and `..` without touching the filesystem
    let mut parts: Vec<Component> = Vec::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(Component::Normal(_))) {
                    parts.pop();
                } else {
                    parts.push(component);
                }
            }
            other => parts.push(other),
        }
    }
    let mut normalized: PathBuf = parts.iter().map(|c| c.as_os_str()).collect();

    if normalized.extension().is_none() {
        normalized.set_extension("tsx");
    }
    Some(normalized)
}
