//! Multi-pass inference: element → declaration → parameter type → schema.
//!
//! Pass 1 resolves the element's tag to a component declaration (local, or
//! through an import binding, following identifier aliases and one level of
//! wrapping calls). Pass 2 resolves the declared parameter type to an object
//! type, merging multiple declaration sites. Pass 3 converts each property
//! into a descriptor, merges destructured defaults and the element's
//! assigned values, and orders union variants.
//!
//! Failure recovery is total: anything unresolvable yields [`PropSchema::empty`].

use crate::store::{resolve_module, DocumentStore};
use crate::types::{LiteralValue, PropDescriptor, PropKind, PropSchema, Transforms, ValueKind};
use ordered_float::OrderedFloat;
use stagehand_parser::ast::{
    Declaration, ElementId, ElementNode, ImportBindingKind, Initializer, PropertySig, PropsParam,
    SceneDocument, TupleMember, TypeExpr, ValueExpr,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Guard against cyclic type references.
const MAX_TYPE_DEPTH: u8 = 8;

pub struct InferenceEngine {
    /// Enum-label memo, keyed by the type reference's source text.
    label_cache: HashMap<String, Option<(LiteralValue, String)>>,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceEngine {
    pub fn new() -> Self {
        Self {
            label_cache: HashMap::new(),
        }
    }

    /// Infer the prop schema for one element of the document at `doc_path`.
    ///
    /// Never fails: unresolvable signatures produce the empty schema.
    pub fn infer_element_schema(
        &mut self,
        store: &dyn DocumentStore,
        doc_path: &Path,
        element_id: ElementId,
    ) -> PropSchema {
        let Some(doc) = store.document(doc_path) else {
            return PropSchema::empty();
        };
        let Some(element) = doc.elements.get(element_id) else {
            return PropSchema::empty();
        };
        let Some(tag) = element.tag_name() else {
            return PropSchema::empty();
        };

        if element.is_host() {
            // Host primitives carry no user-defined schema; only the
            // element's own assignments drive the gizmo flags.
            return PropSchema {
                props: Vec::new(),
                transforms: sniff_transforms(element, &[]),
            };
        }

        let Some((decl_path, decl)) = resolve_component(store, doc_path, doc, tag) else {
            return PropSchema::empty();
        };
        let Some(decl_doc) = store.document(&decl_path) else {
            return PropSchema::empty();
        };

        let param = match decl {
            Declaration::Function(f) => f.props_param.as_ref(),
            Declaration::Variable(v) => match &v.init {
                Initializer::Arrow { props_param, .. } => props_param.as_ref(),
                _ => None,
            },
            Declaration::Alias(_) => None,
        };

        let mut props = match param {
            Some(param) => self.props_from_param(decl_doc, param),
            None => Vec::new(),
        };

        for descriptor in &mut props {
            if let Some(attr) = element.attribute(&descriptor.name) {
                if let Some(value) = &attr.value {
                    let expr = value.as_value_expr();
                    descriptor.value_kind = Some(value_kind_of(&expr));
                    descriptor.value = value_to_json(&expr);
                }
            }
            reorder_union(descriptor);
        }

        let transforms = sniff_transforms(element, &props);
        PropSchema { props, transforms }
    }

    /// Pass 2+3: descriptors for a component's props parameter.
    fn props_from_param(&mut self, decl_doc: &SceneDocument, param: &PropsParam) -> Vec<PropDescriptor> {
        let defaults: HashMap<&str, &ValueExpr> = param
            .bindings
            .iter()
            .filter_map(|b| b.default.as_ref().map(|d| (b.name.as_str(), d)))
            .collect();

        let properties = param
            .type_ann
            .as_ref()
            .and_then(|ty| self.resolve_object_type(decl_doc, ty, 0));

        match properties {
            Some(properties) => properties
                .iter()
                .map(|prop| {
                    let mut descriptor = self
                        .convert_type(decl_doc, &prop.ty, 0)
                        .unwrap_or_else(|| PropDescriptor::new(PropKind::Unhandled, ""));
                    descriptor.name = prop.name.clone();
                    descriptor.description = prop.description.clone();
                    descriptor.tags = prop.tags.clone();
                    if let Some(default) = defaults.get(prop.name.as_str()) {
                        descriptor.default_value = value_to_json(default);
                    }
                    descriptor.required = !prop.optional && descriptor.default_value.is_none();
                    descriptor
                })
                .collect(),
            // No resolvable annotation: fall back to the destructuring
            // pattern so arrow components without types stay editable.
            None => param
                .bindings
                .iter()
                .map(|binding| {
                    let mut descriptor = match &binding.default {
                        Some(default) => descriptor_from_value(default, &binding.name),
                        None => PropDescriptor::new(PropKind::Unhandled, binding.name.clone()),
                    };
                    descriptor.default_value =
                        binding.default.as_ref().and_then(value_to_json);
                    descriptor.required = false;
                    descriptor
                })
                .collect(),
        }
    }

    /// Resolve a type expression down to object properties, merging every
    /// declaration site that contributes to the same symbol.
    fn resolve_object_type<'a>(
        &mut self,
        doc: &'a SceneDocument,
        ty: &'a TypeExpr,
        depth: u8,
    ) -> Option<Vec<PropertySig>> {
        if depth > MAX_TYPE_DEPTH {
            return None;
        }
        match ty {
            TypeExpr::Object(props) => Some(props.clone()),
            TypeExpr::Ref { name, .. } => {
                let sites: Vec<&TypeExpr> = doc
                    .types
                    .iter()
                    .filter(|t| &t.name == name)
                    .map(|t| &t.ty)
                    .collect();
                if sites.is_empty() {
                    return None;
                }

                let mut merged: Vec<PropertySig> = Vec::new();
                for site in sites {
                    let props = self.resolve_object_type(doc, site, depth + 1)?;
                    for prop in props {
                        if let Some(existing) =
                            merged.iter_mut().find(|p| p.name == prop.name)
                        {
                            // Concatenate docs from every declaration site
                            existing.description =
                                match (existing.description.take(), prop.description) {
                                    (Some(a), Some(b)) => Some(format!("{}\n{}", a, b)),
                                    (a, b) => a.or(b),
                                };
                            for (tag, value) in prop.tags {
                                existing.tags.entry(tag).or_insert(value);
                            }
                        } else {
                            merged.push(prop);
                        }
                    }
                }
                Some(merged)
            }
            _ => None,
        }
    }

    /// Convert a type expression into a descriptor shape. `None` means the
    /// member is unhandled (dropped inside unions).
    fn convert_type(
        &mut self,
        doc: &SceneDocument,
        ty: &TypeExpr,
        depth: u8,
    ) -> Option<PropDescriptor> {
        if depth > MAX_TYPE_DEPTH {
            return None;
        }
        match ty {
            TypeExpr::Number => Some(PropDescriptor::new(PropKind::Number, "")),
            TypeExpr::String => Some(PropDescriptor::new(PropKind::String, "")),
            TypeExpr::Boolean => Some(PropDescriptor::new(PropKind::Boolean, "")),
            TypeExpr::LiteralNumber(n) => {
                let mut d = PropDescriptor::new(PropKind::Number, "");
                d.literal = Some(LiteralValue::Number(OrderedFloat(*n)));
                Some(d)
            }
            TypeExpr::LiteralString(s) => {
                let mut d = PropDescriptor::new(PropKind::String, "");
                d.literal = Some(LiteralValue::String(s.clone()));
                Some(d)
            }
            TypeExpr::LiteralBoolean(b) => {
                let mut d = PropDescriptor::new(PropKind::Boolean, "");
                d.literal = Some(LiteralValue::Boolean(*b));
                Some(d)
            }
            TypeExpr::Tuple(members) => {
                let mut d = PropDescriptor::new(PropKind::Tuple, "");
                d.shape = members
                    .iter()
                    .map(|m| self.convert_tuple_member(doc, m, depth + 1))
                    .collect();
                Some(d)
            }
            TypeExpr::Union(members) => {
                let mut shape: Vec<PropDescriptor> = Vec::new();
                for member in members {
                    match self.convert_type(doc, member, depth + 1) {
                        Some(d) if d.kind == PropKind::Union => {
                            // Flatten nested unions
                            for inner in d.shape {
                                if !shape.iter().any(|s| s.same_shape(&inner)) {
                                    shape.push(inner);
                                }
                            }
                        }
                        Some(d) => {
                            if !shape.iter().any(|s| s.same_shape(&d)) {
                                shape.push(d);
                            }
                        }
                        None => {} // unhandled member, dropped
                    }
                }
                match shape.len() {
                    0 => None,
                    1 => Some(shape.pop().unwrap()),
                    _ => {
                        let mut d = PropDescriptor::new(PropKind::Union, "");
                        d.shape = shape;
                        Some(d)
                    }
                }
            }
            TypeExpr::Ref { name, .. } => {
                let target = doc.types.iter().find(|t| &t.name == name)?;
                let ty = target.ty.clone();
                self.convert_type(doc, &ty, depth + 1)
            }
            TypeExpr::TypeofRef { name, text } => {
                let resolved = match self.label_cache.get(text) {
                    Some(cached) => cached.clone(),
                    None => {
                        let resolved = resolve_const_literal(doc, name);
                        self.label_cache.insert(text.clone(), resolved.clone());
                        resolved
                    }
                };
                let (literal, label) = resolved?;
                let kind = match &literal {
                    LiteralValue::Number(_) => PropKind::Number,
                    LiteralValue::String(_) => PropKind::String,
                    LiteralValue::Boolean(_) => PropKind::Boolean,
                };
                let mut d = PropDescriptor::new(kind, "");
                d.literal = Some(literal);
                d.label = Some(label);
                Some(d)
            }
            TypeExpr::Object(_) | TypeExpr::Unhandled { .. } => None,
        }
    }

    fn convert_tuple_member(
        &mut self,
        doc: &SceneDocument,
        member: &TupleMember,
        depth: u8,
    ) -> PropDescriptor {
        let mut d = self
            .convert_type(doc, &member.ty, depth)
            .unwrap_or_else(|| PropDescriptor::new(PropKind::Unhandled, ""));
        if let Some(label) = &member.label {
            d.name = label.clone();
        }
        d.required = !member.optional;
        d
    }
}

/// Resolve a tag to its component declaration, following import bindings,
/// identifier aliases and one level of wrapping calls.
fn resolve_component<'a>(
    store: &'a dyn DocumentStore,
    doc_path: &Path,
    doc: &'a SceneDocument,
    tag: &str,
) -> Option<(PathBuf, &'a Declaration)> {
    // Dotted tags go through a namespace import: `NS.Box`
    if let Some((ns, member)) = tag.split_once('.') {
        let (import, kind) = doc.find_import_binding(ns)?;
        if !matches!(kind, ImportBindingKind::Namespace) {
            return None;
        }
        let target = resolve_module(doc_path, &import.module)?;
        let target_doc = store.document(&target)?;
        let decl = resolve_export(target_doc, member)?;
        return Some((target, decl));
    }

    // Local declaration wins over imports
    if let Some(decl) = doc.find_declaration(tag) {
        return Some((doc_path.to_path_buf(), follow_wrapper(doc, decl)));
    }

    let (import, kind) = doc.find_import_binding(tag)?;
    let export_name = match kind {
        ImportBindingKind::Default => "default".to_string(),
        ImportBindingKind::Named { export_name } => export_name,
        ImportBindingKind::Namespace => return None,
    };
    let target = resolve_module(doc_path, &import.module)?;
    let target_doc = store.document(&target)?;
    let decl = resolve_export(target_doc, &export_name)?;
    Some((target, decl))
}

/// Resolve an export, following aliases and one level of wrapping calls.
pub fn resolve_export<'a>(doc: &'a SceneDocument, export_name: &str) -> Option<&'a Declaration> {
    let decl = doc.find_export(export_name)?;
    if let Declaration::Alias(alias) = decl {
        let target = doc.find_declaration(&alias.target)?;
        return Some(follow_wrapper(doc, target));
    }
    Some(follow_wrapper(doc, decl))
}

/// `const Scene = memo(Inner)` resolves to `Inner`, one level deep.
fn follow_wrapper<'a>(doc: &'a SceneDocument, decl: &'a Declaration) -> &'a Declaration {
    if let Declaration::Variable(v) = decl {
        if let Initializer::Call { argument, .. } = &v.init {
            if let Some(inner) = doc.find_declaration(argument) {
                return inner;
            }
        }
    }
    decl
}

fn resolve_const_literal(doc: &SceneDocument, name: &str) -> Option<(LiteralValue, String)> {
    // Only simple const references are labeled; dotted paths stay opaque
    if name.contains('.') {
        return None;
    }
    match doc.find_declaration(name)? {
        Declaration::Variable(v) => match &v.init {
            Initializer::Literal(ValueExpr::Number(n)) => {
                Some((LiteralValue::Number(OrderedFloat(*n)), name.to_string()))
            }
            Initializer::Literal(ValueExpr::String(s)) => {
                Some((LiteralValue::String(s.clone()), name.to_string()))
            }
            Initializer::Literal(ValueExpr::Bool(b)) => {
                Some((LiteralValue::Boolean(*b), name.to_string()))
            }
            _ => None,
        },
        _ => None,
    }
}

/// Reorder a union so the variant matching the assigned value or default
/// comes first. Literal-only unions keep declaration order.
fn reorder_union(descriptor: &mut PropDescriptor) {
    if descriptor.kind != PropKind::Union {
        return;
    }
    if descriptor.shape.iter().all(|m| m.literal.is_some()) {
        return;
    }
    let probe = match descriptor.value.clone().or_else(|| descriptor.default_value.clone()) {
        Some(v) => v,
        None => return,
    };
    if let Some(idx) = descriptor.shape.iter().position(|m| member_matches(m, &probe)) {
        if idx > 0 {
            let member = descriptor.shape.remove(idx);
            descriptor.shape.insert(0, member);
        }
    }
}

/// First-match-wins by declaration order; no partial-match heuristics.
fn member_matches(member: &PropDescriptor, value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Number(n) => match (member.kind, &member.literal) {
            (PropKind::Number, None) => true,
            (PropKind::Number, Some(LiteralValue::Number(l))) => {
                n.as_f64() == Some(l.into_inner())
            }
            _ => false,
        },
        serde_json::Value::String(s) => match (member.kind, &member.literal) {
            (PropKind::String, None) => true,
            (PropKind::String, Some(LiteralValue::String(l))) => l == s,
            _ => false,
        },
        serde_json::Value::Bool(b) => match (member.kind, &member.literal) {
            (PropKind::Boolean, None) => true,
            (PropKind::Boolean, Some(LiteralValue::Boolean(l))) => l == b,
            _ => false,
        },
        serde_json::Value::Array(items) => {
            member.kind == PropKind::Tuple
                && items.len() <= member.shape.len()
                && items.len() >= member.shape.iter().filter(|m| m.required).count()
        }
        _ => false,
    }
}

fn value_kind_of(value: &ValueExpr) -> ValueKind {
    match value {
        ValueExpr::Number(_) => ValueKind::Number,
        ValueExpr::String(_) => ValueKind::String,
        ValueExpr::Bool(_) => ValueKind::Boolean,
        ValueExpr::Array(_) => ValueKind::Array,
        ValueExpr::Identifier(_) => ValueKind::Identifier,
        ValueExpr::Opaque(_) => ValueKind::Unhandled,
    }
}

/// Serialize a concrete value; identifiers and opaque expressions have no
/// static value.
fn value_to_json(value: &ValueExpr) -> Option<serde_json::Value> {
    match value {
        ValueExpr::Number(n) => Some(serde_json::json!(n)),
        ValueExpr::String(s) => Some(serde_json::Value::String(s.clone())),
        ValueExpr::Bool(b) => Some(serde_json::Value::Bool(*b)),
        ValueExpr::Array(items) => {
            let converted: Option<Vec<_>> = items.iter().map(value_to_json).collect();
            converted.map(serde_json::Value::Array)
        }
        ValueExpr::Identifier(_) | ValueExpr::Opaque(_) => None,
    }
}

/// Fallback descriptor when only a destructured default is known.
fn descriptor_from_value(value: &ValueExpr, name: &str) -> PropDescriptor {
    let kind = match value {
        ValueExpr::Number(_) => PropKind::Number,
        ValueExpr::String(_) => PropKind::String,
        ValueExpr::Bool(_) => PropKind::Boolean,
        ValueExpr::Array(_) => PropKind::Tuple,
        ValueExpr::Identifier(_) | ValueExpr::Opaque(_) => PropKind::Unhandled,
    };
    let mut descriptor = PropDescriptor::new(kind, name);
    if let ValueExpr::Array(items) = value {
        descriptor.shape = items
            .iter()
            .map(|item| {
                let mut member = descriptor_from_value(item, "");
                member.required = true;
                member
            })
            .collect();
    }
    descriptor
}

/// Derive gizmo flags: an explicitly assigned concrete, non-identifier
/// value enables the flag; with no assignment at all, the prop's presence
/// in the type does.
fn sniff_transforms(element: &ElementNode, props: &[PropDescriptor]) -> Transforms {
    let flag = |attr_name: &str| -> bool {
        match element.attribute(attr_name) {
            Some(attr) => match &attr.value {
                Some(value) => value.as_value_expr().is_concrete(),
                None => false,
            },
            None => props.iter().any(|p| p.name == attr_name),
        }
    };

    Transforms {
        translate: flag("position"),
        rotate: flag("rotation"),
        scale: flag("scale"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_parser::parse;
    use std::collections::HashMap as Map;

    struct MemoryStore {
        docs: Map<PathBuf, SceneDocument>,
    }

    impl MemoryStore {
        fn new(files: &[(&str, &str)]) -> Self {
            let docs = files
                .iter()
                .map(|(path, source)| (PathBuf::from(path), parse(source).unwrap()))
                .collect();
            Self { docs }
        }
    }

    impl DocumentStore for MemoryStore {
        fn document(&self, path: &Path) -> Option<&SceneDocument> {
            self.docs.get(path)
        }
    }

    fn element_by_tag(doc: &SceneDocument, tag: &str) -> ElementId {
        doc.elements
            .iter()
            .find(|(_, node)| node.tag_name() == Some(tag))
            .map(|(id, _)| id)
            .unwrap()
    }

    const BOX_SOURCE: &str = r#"
type BoxProps = {
  /** Uniform scale factor. */
  scale?: number;
  size?: number | [x: number, y: number, z: number];
  color: "red" | "blue";
  position?: [number, number, number];
};

export default function Box({ scale = 1, size = 2 }: BoxProps) {
  return <mesh />;
}
"#;

    #[test]
    fn test_host_element_has_empty_props() {
        let store = MemoryStore::new(&[(
            "/p/scene.tsx",
            "export default function S() { return <mesh position={[1, 2, 3]} />; }",
        )]);
        let doc = store.document(Path::new("/p/scene.tsx")).unwrap();
        let id = element_by_tag(doc, "mesh");

        let schema =
            InferenceEngine::new().infer_element_schema(&store, Path::new("/p/scene.tsx"), id);
        assert!(schema.props.is_empty());
        assert!(schema.transforms.translate);
        assert!(!schema.transforms.rotate);
    }

    #[test]
    fn test_unresolved_custom_element_is_empty_schema() {
        let store = MemoryStore::new(&[(
            "/p/scene.tsx",
            "import { Box } from \"three\";\nexport default function S() { return <Box position={[1, 2, 3]} />; }",
        )]);
        let doc = store.document(Path::new("/p/scene.tsx")).unwrap();
        let id = element_by_tag(doc, "Box");

        let schema =
            InferenceEngine::new().infer_element_schema(&store, Path::new("/p/scene.tsx"), id);
        assert_eq!(schema, PropSchema::empty());
    }

    #[test]
    fn test_imported_component_props_and_defaults() {
        let store = MemoryStore::new(&[
            (
                "/p/scene.tsx",
                "import Box from \"./box\";\nexport default function S() { return <Box color=\"red\" />; }",
            ),
            ("/p/box.tsx", BOX_SOURCE),
        ]);
        let doc = store.document(Path::new("/p/scene.tsx")).unwrap();
        let id = element_by_tag(doc, "Box");

        let schema =
            InferenceEngine::new().infer_element_schema(&store, Path::new("/p/scene.tsx"), id);

        let scale = schema.props.iter().find(|p| p.name == "scale").unwrap();
        assert_eq!(scale.kind, PropKind::Number);
        assert_eq!(scale.default_value, Some(serde_json::json!(1.0)));
        assert!(!scale.required);
        assert_eq!(scale.description.as_deref(), Some("Uniform scale factor."));

        let color = schema.props.iter().find(|p| p.name == "color").unwrap();
        assert!(color.required);
        assert_eq!(color.value, Some(serde_json::json!("red")));
        assert_eq!(color.value_kind, Some(ValueKind::String));

        // scale prop present in type, no explicit assignment
        assert!(schema.transforms.scale);
        assert!(schema.transforms.translate);
    }

    #[test]
    fn test_union_reorders_tuple_first_for_array_value() {
        let store = MemoryStore::new(&[
            (
                "/p/scene.tsx",
                "import Box from \"./box\";\nexport default function S() { return <Box size={[1, 2, 3]} color=\"red\" />; }",
            ),
            ("/p/box.tsx", BOX_SOURCE),
        ]);
        let doc = store.document(Path::new("/p/scene.tsx")).unwrap();
        let id = element_by_tag(doc, "Box");

        let schema =
            InferenceEngine::new().infer_element_schema(&store, Path::new("/p/scene.tsx"), id);
        let size = schema.props.iter().find(|p| p.name == "size").unwrap();
        assert_eq!(size.kind, PropKind::Union);
        assert_eq!(size.shape[0].kind, PropKind::Tuple);
        assert_eq!(size.shape[1].kind, PropKind::Number);
    }

    #[test]
    fn test_union_reorders_number_first_for_default() {
        let store = MemoryStore::new(&[
            (
                "/p/scene.tsx",
                "import Box from \"./box\";\nexport default function S() { return <Box color=\"red\" />; }",
            ),
            ("/p/box.tsx", BOX_SOURCE),
        ]);
        let doc = store.document(Path::new("/p/scene.tsx")).unwrap();
        let id = element_by_tag(doc, "Box");

        let schema =
            InferenceEngine::new().infer_element_schema(&store, Path::new("/p/scene.tsx"), id);
        // default is `size = 2`, a plain number
        let size = schema.props.iter().find(|p| p.name == "size").unwrap();
        assert_eq!(size.shape[0].kind, PropKind::Number);
        assert!(size.shape[0].literal.is_none());
    }

    #[test]
    fn test_literal_only_union_never_reordered() {
        let store = MemoryStore::new(&[
            (
                "/p/scene.tsx",
                "import Box from \"./box\";\nexport default function S() { return <Box color=\"blue\" />; }",
            ),
            ("/p/box.tsx", BOX_SOURCE),
        ]);
        let doc = store.document(Path::new("/p/scene.tsx")).unwrap();
        let id = element_by_tag(doc, "Box");

        let schema =
            InferenceEngine::new().infer_element_schema(&store, Path::new("/p/scene.tsx"), id);
        let color = schema.props.iter().find(|p| p.name == "color").unwrap();
        assert_eq!(color.kind, PropKind::Union);
        assert_eq!(
            color.shape[0].literal,
            Some(LiteralValue::String("red".to_string()))
        );
    }

    #[test]
    fn test_union_drops_unhandled_and_collapses_singleton() {
        let store = MemoryStore::new(&[
            (
                "/p/scene.tsx",
                "import Box from \"./b\";\nexport default function S() { return <Box />; }",
            ),
            (
                "/p/b.tsx",
                "type P = { onClick?: (() => void) | number };\nexport default function Box(props: P) { return <mesh />; }",
            ),
        ]);
        let doc = store.document(Path::new("/p/scene.tsx")).unwrap();
        let id = element_by_tag(doc, "Box");

        let schema =
            InferenceEngine::new().infer_element_schema(&store, Path::new("/p/scene.tsx"), id);
        let prop = schema.props.iter().find(|p| p.name == "onClick").unwrap();
        // the function member dropped, union collapsed to number
        assert_eq!(prop.kind, PropKind::Number);
        assert!(prop.shape.is_empty());
    }

    #[test]
    fn test_enum_labels_from_typeof_consts() {
        let store = MemoryStore::new(&[
            (
                "/p/scene.tsx",
                "import Box from \"./b\";\nexport default function S() { return <Box />; }",
            ),
            (
                "/p/b.tsx",
                "export const FRONT = 0;\nexport const BACK = 1;\ntype P = { side?: typeof FRONT | typeof BACK };\nexport default function Box(props: P) { return <mesh />; }",
            ),
        ]);
        let doc = store.document(Path::new("/p/scene.tsx")).unwrap();
        let id = element_by_tag(doc, "Box");

        let mut engine = InferenceEngine::new();
        let schema = engine.infer_element_schema(&store, Path::new("/p/scene.tsx"), id);
        let side = schema.props.iter().find(|p| p.name == "side").unwrap();
        assert_eq!(side.kind, PropKind::Union);
        assert_eq!(side.shape[0].label.as_deref(), Some("FRONT"));
        assert_eq!(
            side.shape[0].literal,
            Some(LiteralValue::Number(OrderedFloat(0.0)))
        );
        assert_eq!(side.shape[1].label.as_deref(), Some("BACK"));
        // memoized per type text
        assert!(engine.label_cache.contains_key("typeof FRONT"));
    }

    #[test]
    fn test_identifier_assignment_disables_transform() {
        let store = MemoryStore::new(&[(
            "/p/scene.tsx",
            "export default function S() { return <mesh position={dynamicPos} scale={2} />; }",
        )]);
        let doc = store.document(Path::new("/p/scene.tsx")).unwrap();
        let id = element_by_tag(doc, "mesh");

        let schema =
            InferenceEngine::new().infer_element_schema(&store, Path::new("/p/scene.tsx"), id);
        assert!(!schema.transforms.translate);
        assert!(schema.transforms.scale);
    }

    #[test]
    fn test_wrapped_default_export_resolves_one_level() {
        let store = MemoryStore::new(&[
            (
                "/p/scene.tsx",
                "import Box from \"./b\";\nexport default function S() { return <Box />; }",
            ),
            (
                "/p/b.tsx",
                "function Inner({ width = 1 }: { width?: number }) { return <mesh />; }\nexport default memo(Inner);\n",
            ),
        ]);
        let doc = store.document(Path::new("/p/scene.tsx")).unwrap();
        let id = element_by_tag(doc, "Box");

        let schema =
            InferenceEngine::new().infer_element_schema(&store, Path::new("/p/scene.tsx"), id);
        assert_eq!(schema.props.len(), 1);
        assert_eq!(schema.props[0].name, "width");
    }

    #[test]
    fn test_interface_merge_concatenates_descriptions() {
        let store = MemoryStore::new(&[
            (
                "/p/scene.tsx",
                "import Box from \"./b\";\nexport default function S() { return <Box />; }",
            ),
            (
                "/p/b.tsx",
                "interface P {\n  /** First. */\n  width?: number;\n}\ninterface P {\n  /** Second. */\n  width?: number;\n  depth?: number;\n}\nexport default function Box(props: P) { return <mesh />; }",
            ),
        ]);
        let doc = store.document(Path::new("/p/scene.tsx")).unwrap();
        let id = element_by_tag(doc, "Box");

        let schema =
            InferenceEngine::new().infer_element_schema(&store, Path::new("/p/scene.tsx"), id);
        assert_eq!(schema.props.len(), 2);
        let width = schema.props.iter().find(|p| p.name == "width").unwrap();
        assert_eq!(width.description.as_deref(), Some("First.\nSecond."));
    }
}
