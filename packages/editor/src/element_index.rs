//! Position-addressed element index.
//!
//! `locate` walks the element tree under one export and reports every
//! element's line/column (the `<` of its opening tag), display name and,
//! for custom elements, the file/export the tag resolves to. `lookup` is
//! the inverse: exact-match a position back to an element. No fuzzy
//! matching; a stale position is the caller's bug, not ours.

use crate::errors::{EditError, EditResult};
use serde::Serialize;
use stagehand_inference::{resolve_export, resolve_module};
use stagehand_parser::ast::{
    AttrValue, Declaration, ElementId, ElementKind, ImportBindingKind, Initializer, JsxChild,
    SceneDocument,
};
use stagehand_parser::PositionMap;
use std::path::Path;

/// One entry in the element index, shaped for the frontend tree view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPositionNode {
    pub line: u32,
    pub column: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub class: ElementClass,
    pub children: Vec<ElementPositionNode>,
    /// For custom elements: the export the tag resolves to. Empty when the
    /// symbol lives in dependency storage outside the project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementClass {
    Host,
    Custom,
}

/// List the elements under `export_name`, in source order. Fragment roots
/// are flattened into the returned list.
pub fn locate(
    doc: &SceneDocument,
    doc_path: &Path,
    positions: &PositionMap,
    export_name: &str,
) -> EditResult<Vec<ElementPositionNode>> {
    let decl = resolve_export(doc, export_name)
        .ok_or_else(|| EditError::export_not_found(export_name))?;
    let root = match decl {
        Declaration::Function(f) => f.root,
        Declaration::Variable(v) => match &v.init {
            Initializer::Arrow { root, .. } => *root,
            _ => None,
        },
        Declaration::Alias(_) => None,
    };
    let Some(root) = root else {
        return Ok(Vec::new());
    };
    Ok(collect(doc, doc_path, positions, root))
}

/// Build index nodes for `id`, flattening fragments.
fn collect(
    doc: &SceneDocument,
    doc_path: &Path,
    positions: &PositionMap,
    id: ElementId,
) -> Vec<ElementPositionNode> {
    let Some(node) = doc.elements.get(id) else {
        return Vec::new();
    };

    let children: Vec<ElementPositionNode> = node
        .children
        .iter()
        .filter_map(|child| match child {
            JsxChild::Element(child_id) => {
                Some(collect(doc, doc_path, positions, *child_id))
            }
            _ => None,
        })
        .flatten()
        .collect();

    let tag = match &node.kind {
        ElementKind::Fragment => return children,
        ElementKind::Tag { name } => name.clone(),
    };

    let (line, column) = positions.line_col(node.span.start);
    let mut entry = ElementPositionNode {
        line,
        column,
        name: tag.clone(),
        class: if node.is_host() {
            ElementClass::Host
        } else {
            ElementClass::Custom
        },
        children,
        export_name: None,
        path: None,
    };

    if entry.class == ElementClass::Host {
        // Cosmetic display name from a literal `name` attribute
        if let Some(attr) = node.attribute("name") {
            if let Some(AttrValue::String(label)) = &attr.value {
                entry.name = format!("{} ({})", label, tag);
            }
        }
    } else {
        let (path, export) = resolve_custom_target(doc, doc_path, &tag);
        entry.path = Some(path);
        entry.export_name = Some(export);
    }
    vec![entry]
}

/// Resolve a custom tag to the `(path, export)` pair the frontend can
/// navigate to. Symbols that resolve into dependency storage outside the
/// project report empty strings.
fn resolve_custom_target(doc: &SceneDocument, doc_path: &Path, tag: &str) -> (String, String) {
    // Namespace member access: `NS.Box`
    if let Some((ns, member)) = tag.split_once('.') {
        if let Some((import, ImportBindingKind::Namespace)) = doc.find_import_binding(ns) {
            if let Some(path) = resolve_module(doc_path, &import.module) {
                return (path.to_string_lossy().into_owned(), member.to_string());
            }
        }
        return (String::new(), String::new());
    }

    if doc.find_declaration(tag).is_some() {
        return (doc_path.to_string_lossy().into_owned(), tag.to_string());
    }

    if let Some((import, kind)) = doc.find_import_binding(tag) {
        let export = match kind {
            ImportBindingKind::Default => "default".to_string(),
            ImportBindingKind::Named { export_name } => export_name,
            ImportBindingKind::Namespace => return (String::new(), String::new()),
        };
        if let Some(path) = resolve_module(doc_path, &import.module) {
            return (path.to_string_lossy().into_owned(), export);
        }
    }
    (String::new(), String::new())
}

/// Exact positional lookup: the element whose opening `<` sits at
/// `line:column`. Fragments are not addressable.
pub fn lookup_id(
    doc: &SceneDocument,
    positions: &PositionMap,
    line: u32,
    column: u32,
) -> Option<ElementId> {
    doc.elements.iter().find_map(|(id, node)| {
        if matches!(node.kind, ElementKind::Fragment) {
            return None;
        }
        (positions.line_col(node.span.start) == (line, column)).then_some(id)
    })
}

/// Positional lookup returning a full index node (with its subtree).
pub fn lookup(
    doc: &SceneDocument,
    doc_path: &Path,
    positions: &PositionMap,
    line: u32,
    column: u32,
) -> Option<ElementPositionNode> {
    let id = lookup_id(doc, positions, line, column)?;
    collect(doc, doc_path, positions, id).into_iter().next()
}
