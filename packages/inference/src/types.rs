//! Canonical serializable prop schema.
//!
//! This is the portable shape handed to editor frontends: no host-language
//! types leak through it. Everything derives `Serialize` so a transport
//! layer can ship it as-is.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of inferring one element's prop schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropSchema {
    pub props: Vec<PropDescriptor>,
    pub transforms: Transforms,
}

impl PropSchema {
    /// The "no schema available" value. Callers must treat this as an
    /// absence, not an error.
    pub fn empty() -> Self {
        Self {
            props: Vec::new(),
            transforms: Transforms::default(),
        }
    }
}

/// Which transform gizmos apply to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transforms {
    pub translate: bool,
    pub scale: bool,
    pub rotate: bool,
}

/// Descriptor kind. `Unhandled` marks props whose type the engine cannot
/// interpret; they are still listed so the frontend can show them read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropKind {
    Number,
    String,
    Boolean,
    Tuple,
    Union,
    Unhandled,
}

/// Literal values carried by literal types. `OrderedFloat` gives numeric
/// literals `Eq`, which union de-duplication relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Boolean(bool),
    Number(OrderedFloat<f64>),
    String(String),
}

impl LiteralValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            LiteralValue::Boolean(b) => serde_json::Value::Bool(*b),
            LiteralValue::Number(n) => serde_json::json!(n.into_inner()),
            LiteralValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Kind of the value currently assigned on the element, when any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Number,
    String,
    Boolean,
    Array,
    Identifier,
    Unhandled,
}

/// One property's canonical shape: type, default, documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropDescriptor {
    pub kind: PropKind,
    pub name: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Human-readable name for enum-like literal members.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Set when the type is a literal of `kind`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<LiteralValue>,
    /// Tuple members or union variants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shape: Vec<PropDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_kind: Option<ValueKind>,
}

impl PropDescriptor {
    pub fn new(kind: PropKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            required: false,
            description: None,
            tags: BTreeMap::new(),
            label: None,
            literal: None,
            shape: Vec::new(),
            default_value: None,
            value: None,
            value_kind: None,
        }
    }

    /// Structural identity used for union de-duplication: the type shape
    /// only, ignoring documentation and assigned values.
    pub fn same_shape(&self, other: &PropDescriptor) -> bool {
        self.kind == other.kind
            && self.literal == other.literal
            && self.shape.len() == other.shape.len()
            && self
                .shape
                .iter()
                .zip(other.shape.iter())
                .all(|(a, b)| a.same_shape(b) && a.required == b.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_shape_ignores_docs() {
        let mut a = PropDescriptor::new(PropKind::Number, "x");
        let mut b = PropDescriptor::new(PropKind::Number, "y");
        a.description = Some("doc".to_string());
        b.value = Some(serde_json::json!(3));
        assert!(a.same_shape(&b));
    }

    #[test]
    fn test_same_shape_distinguishes_literals() {
        let mut a = PropDescriptor::new(PropKind::String, "");
        a.literal = Some(LiteralValue::String("red".to_string()));
        let mut b = PropDescriptor::new(PropKind::String, "");
        b.literal = Some(LiteralValue::String("blue".to_string()));
        assert!(!a.same_shape(&b));
        assert!(a.same_shape(&a.clone()));
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut d = PropDescriptor::new(PropKind::Number, "scale");
        d.default_value = Some(serde_json::json!(1));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "number");
        assert_eq!(json["defaultValue"], 1);
        assert!(json.get("value").is_none());
    }
}
