//! AST for scene source files.
//!
//! The tree is deliberately shallow: the editor rewrites source text, so
//! every node carries byte spans into the original source and anything the
//! editor never touches (statement bodies, complex expressions) stays opaque.
//!
//! JSX elements live in an arena indexed by [`ElementId`], with parent links
//! stored as ids rather than live back-pointers, so a splice-and-reparse can
//! never leave dangling references.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Byte range into the document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Root document node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub imports: Vec<ImportDecl>,
    pub declarations: Vec<Declaration>,
    pub types: Vec<TypeDecl>,
    pub elements: ElementArena,
}

impl SceneDocument {
    /// Find a top-level declaration by its exported name.
    /// `"default"` matches the default export.
    pub fn find_export(&self, export_name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|decl| match decl {
            Declaration::Function(f) => f.export.matches(export_name, &f.name),
            Declaration::Variable(v) => v.export.matches(export_name, &v.name),
            Declaration::Alias(a) => a.export_name == export_name,
        })
    }

    /// Find a top-level declaration by its local name.
    pub fn find_declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|decl| match decl {
            Declaration::Function(f) => f.name == name,
            Declaration::Variable(v) => v.name == name,
            Declaration::Alias(_) => false,
        })
    }

    /// Find a type declaration by name.
    pub fn find_type(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Find the import that binds `local` (default, namespace or named),
    /// returning the binding kind alongside the declaration.
    pub fn find_import_binding(&self, local: &str) -> Option<(&ImportDecl, ImportBindingKind)> {
        for import in &self.imports {
            if import.default_name.as_deref() == Some(local) {
                return Some((import, ImportBindingKind::Default));
            }
            if import.namespace.as_deref() == Some(local) {
                return Some((import, ImportBindingKind::Namespace));
            }
            for named in &import.named {
                if named.local_name == local {
                    return Some((
                        import,
                        ImportBindingKind::Named {
                            export_name: named.export_name.clone(),
                        },
                    ));
                }
            }
        }
        None
    }
}

/// How an import binding maps a local name onto the source module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImportBindingKind {
    Default,
    Namespace,
    Named { export_name: String },
}

/// Import statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub module: String,
    pub default_name: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<NamedImport>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedImport {
    pub export_name: String,
    pub local_name: String,
}

/// Whether and how a declaration is exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportKind {
    None,
    Named,
    Default,
}

impl ExportKind {
    fn matches(&self, export_name: &str, local_name: &str) -> bool {
        match self {
            ExportKind::Default => export_name == "default",
            ExportKind::Named => export_name == local_name,
            ExportKind::None => false,
        }
    }
}

/// Closed set of top-level declaration kinds. Every consumer matches
/// exhaustively; there is no dynamic "what kind of node is this" probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Declaration {
    Function(FunctionDecl),
    Variable(VariableDecl),
    /// `export default Name;` or `export { Name as Alias };`
    Alias(AliasDecl),
}

impl Declaration {
    pub fn span(&self) -> Span {
        match self {
            Declaration::Function(f) => f.span,
            Declaration::Variable(v) => v.span,
            Declaration::Alias(a) => a.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub export: ExportKind,
    pub props_param: Option<PropsParam>,
    pub body_span: Span,
    pub root: Option<ElementId>,
    pub span: Span,
    /// Span of the identifier token in `function <name>`.
    pub name_span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    pub export: ExportKind,
    pub init: Initializer,
    pub span: Span,
    pub name_span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    Arrow {
        props_param: Option<PropsParam>,
        root: Option<ElementId>,
        body_span: Span,
    },
    /// Wrapping call such as `memo(Scene)`; followed one level deep.
    Call { callee: String, argument: String },
    Literal(ValueExpr),
    Opaque(Span),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasDecl {
    pub export_name: String,
    pub target: String,
    pub span: Span,
}

/// The props parameter of a component: either a plain identifier or a
/// destructuring pattern, with an optional type annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropsParam {
    pub ident: Option<String>,
    pub bindings: Vec<ParamBinding>,
    pub type_ann: Option<TypeExpr>,
    pub span: Span,
}

/// One destructured binding, e.g. `scale = 1` in `({ scale = 1 })`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamBinding {
    pub name: String,
    pub default: Option<ValueExpr>,
}

/// Type alias or interface declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Type expression subset. Forms the editor cannot interpret parse as
/// `Unhandled` and follow the union-member drop rule during inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    Number,
    String,
    Boolean,
    LiteralNumber(f64),
    LiteralString(String),
    LiteralBoolean(bool),
    Tuple(Vec<TupleMember>),
    Union(Vec<TypeExpr>),
    Object(Vec<PropertySig>),
    /// Reference to a named type; `text` preserves the exact source text.
    Ref { name: String, text: String },
    /// `typeof CONST` reference to a const declaration.
    TypeofRef { name: String, text: String },
    Unhandled { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleMember {
    pub label: Option<String>,
    pub optional: bool,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySig {
    pub name: String,
    pub optional: bool,
    pub ty: TypeExpr,
    pub description: Option<String>,
    pub tags: BTreeMap<String, String>,
}

/// Shallow value expression, used for attribute values and binding defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueExpr {
    Number(f64),
    String(String),
    Bool(bool),
    Array(Vec<ValueExpr>),
    Identifier(String),
    Opaque(String),
}

impl ValueExpr {
    /// Concrete, statically-known value (not bound to a runtime identifier).
    pub fn is_concrete(&self) -> bool {
        match self {
            ValueExpr::Number(_) | ValueExpr::String(_) | ValueExpr::Bool(_) => true,
            ValueExpr::Array(items) => items.iter().all(|v| v.is_concrete()),
            ValueExpr::Identifier(_) | ValueExpr::Opaque(_) => false,
        }
    }
}

/// Index of an element in the document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u32);

/// Arena of JSX nodes. Rebuilt on every parse; ids are only meaningful
/// against the arena they came from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementArena {
    nodes: Vec<ElementNode>,
}

impl ElementArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: ElementNode) -> ElementId {
        let id = ElementId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&ElementNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &ElementNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (ElementId(i as u32), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub parent: Option<ElementId>,
    pub kind: ElementKind,
    pub attributes: Vec<JsxAttribute>,
    pub children: Vec<JsxChild>,
    /// Full element span, opening `<` through closing `>`.
    pub span: Span,
    /// Opening tag only, `<` through its `>` (or `/>`).
    pub open_span: Span,
    /// Closing tag `</name>`; `None` when self-closing.
    pub close_span: Option<Span>,
    pub self_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    Fragment,
    Tag { name: String },
}

impl ElementNode {
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Tag { name } => Some(name),
            ElementKind::Fragment => None,
        }
    }

    /// Host elements are built-in primitives: plain lower-case tag names.
    pub fn is_host(&self) -> bool {
        match &self.kind {
            ElementKind::Tag { name } => {
                !name.contains('.')
                    && name
                        .chars()
                        .next()
                        .map(|c| c.is_ascii_lowercase())
                        .unwrap_or(false)
            }
            ElementKind::Fragment => false,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&JsxAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JsxChild {
    Element(ElementId),
    Text(Span),
    Expression(Span),
    /// A soft-delete pragma comment hiding an element's text.
    DeletedPragma(Span),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsxAttribute {
    pub name: String,
    pub value: Option<AttrValue>,
    /// Entire attribute, name through value.
    pub span: Span,
    /// The value text only: `"str"` or `{expr}` inclusive.
    pub value_span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    String(String),
    Expression(ValueExpr),
}

impl AttrValue {
    pub fn as_value_expr(&self) -> ValueExpr {
        match self {
            AttrValue::String(s) => ValueExpr::String(s.clone()),
            AttrValue::Expression(v) => v.clone(),
        }
    }
}
