//! Structural mutation operations.
//!
//! Every operation is a text splice against the [`EditBuffer`]: the element
//! tree locates targets and supplies spans, the splice rewrites the text,
//! and the reparse inside `splice`/`splice_all` rebuilds the tree. Elements
//! the operation does not touch keep their exact source text, so their
//! positions stay stable.

use crate::document::EditBuffer;
use crate::element_index::lookup_id;
use crate::errors::{EditError, EditResult};
use crate::pragma;
use serde_json::Value;
use stagehand_inference::resolve_export;
use stagehand_parser::ast::{Declaration, ElementId, ElementNode, Initializer};
use stagehand_parser::tokenizer::{tokenize, Token};
use std::ops::Range;

/// Description of an element to insert.
pub struct NewElement {
    /// Requested tag / local name. For custom elements this is a hint;
    /// an existing import binding for the same target wins, and name
    /// collisions get a numeric suffix.
    pub tag: String,
    pub kind: NewElementKind,
    /// Initial attributes, rendered in key order.
    pub props: serde_json::Map<String, Value>,
}

pub enum NewElementKind {
    Host,
    Custom { module: String, export_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlacement {
    Before,
    After,
    MakeChild,
}

impl EditBuffer {
    /// Insert a new element: as the last child of `parent` when given,
    /// otherwise at the document-level insertion point of `export_name`
    /// (before the closing tag of its root). Returns the new element's
    /// position.
    pub fn add_element(
        &mut self,
        export_name: &str,
        new: &NewElement,
        parent: Option<(u32, u32)>,
    ) -> EditResult<(u32, u32)> {
        let (tag, import_edit) = match &new.kind {
            NewElementKind::Host => (new.tag.clone(), None),
            NewElementKind::Custom {
                module,
                export_name,
            } => self.resolve_import_binding(&new.tag, module, export_name),
        };
        let element_text = render_element(&tag, &new.props);

        let target = match parent {
            Some((line, column)) => self.element_at(line, column)?,
            None => self.export_root(export_name)?,
        };
        let node = self.node(target)?.clone();
        let (range, replacement, prefix) = self.insertion_into(&node, &element_text)?;

        let mut new_offset = range.start + prefix;
        let mut edits = vec![(range, replacement)];
        if let Some((at, statement)) = import_edit {
            if at <= new_offset {
                new_offset += statement.len();
            }
            edits.push((at..at, statement));
        }
        self.splice_all(edits)?;
        Ok(self.positions().line_col(new_offset))
    }

    /// Clone an element's exact source text immediately after the original.
    /// Returns the clone's position.
    pub fn duplicate(&mut self, line: u32, column: u32) -> EditResult<(u32, u32)> {
        let id = self.element_at(line, column)?;
        let node = self.node(id)?;
        let span = node.span;
        let text = span.slice(self.text()).to_string();
        let indent = indent_at(self.text(), span.start);
        let replacement = format!("\n{}{}", indent, text);
        let new_offset = span.end + 1 + indent.len();
        self.splice(span.end..span.end, &replacement)?;
        Ok(self.positions().line_col(new_offset))
    }

    /// Relocate an element's source text relative to `dst`. Returns the
    /// element's new position.
    pub fn move_element(
        &mut self,
        src: (u32, u32),
        dst: (u32, u32),
        placement: MovePlacement,
    ) -> EditResult<(u32, u32)> {
        let src_id = self.element_at(src.0, src.1)?;
        let dst_id = self.element_at(dst.0, dst.1)?;
        let src_node = self.node(src_id)?.clone();
        let dst_node = self.node(dst_id)?.clone();

        if src_id == dst_id
            || (dst_node.span.start >= src_node.span.start
                && dst_node.span.end <= src_node.span.end)
        {
            return Err(EditError::invariant(
                "cannot move an element into its own subtree",
            ));
        }

        let src_text = src_node.span.slice(self.text()).to_string();
        let removal = removal_range(self.text(), src_node.span.start, src_node.span.end);
        let removed_len = removal.end - removal.start;

        let dst_indent = indent_at(self.text(), dst_node.span.start);
        let (insert_range, replacement, prefix) = match placement {
            MovePlacement::Before => (
                dst_node.span.start..dst_node.span.start,
                format!("{}\n{}", src_text, dst_indent),
                0,
            ),
            MovePlacement::After => (
                dst_node.span.end..dst_node.span.end,
                format!("\n{}{}", dst_indent, src_text),
                1 + dst_indent.len(),
            ),
            MovePlacement::MakeChild => self.insertion_into(&dst_node, &src_text)?,
        };

        if insert_range.start >= removal.start && insert_range.start < removal.end {
            return Err(EditError::invariant("move destination overlaps the source"));
        }

        let mut new_offset = insert_range.start + prefix;
        if removal.end <= insert_range.start {
            new_offset -= removed_len;
        }
        self.splice_all(vec![
            (removal, String::new()),
            (insert_range, replacement),
        ])?;
        Ok(self.positions().line_col(new_offset))
    }

    /// Hide an element behind a delete pragma without removing its text.
    pub fn delete_element(&mut self, line: u32, column: u32) -> EditResult<()> {
        let id = self.element_at(line, column)?;
        let span = self.node(id)?.span;
        let wrapped = pragma::wrap(span.slice(self.text()));
        self.splice(span.start..span.end, &wrapped)
    }

    /// Reverse a soft delete. The locator is the pragma's own position,
    /// which equals the element's position before deletion.
    pub fn restore_element(&mut self, line: u32, column: u32) -> EditResult<(u32, u32)> {
        let offset = self
            .positions()
            .offset(line, column)
            .filter(|at| self.text().is_char_boundary(*at))
            .filter(|at| self.text()[*at..].starts_with(pragma::OPEN))
            .ok_or(EditError::deleted_element_not_found(line, column))?;
        // Inner pragmas are escaped, so the first CLOSE is ours.
        let close = self.text()[offset..]
            .find(pragma::CLOSE)
            .ok_or(EditError::deleted_element_not_found(line, column))?;
        let end = offset + close + pragma::CLOSE.len();
        let restored = pragma::unwrap(&self.text()[offset..end])
            .ok_or(EditError::deleted_element_not_found(line, column))?;
        self.splice(offset..end, &restored)?;
        Ok((line, column))
    }

    /// Rename a top-level declaration and its local references. References
    /// behind member access, object keys and import statements are left
    /// alone.
    pub fn rename_declaration(&mut self, old_name: &str, new_name: &str) -> EditResult<()> {
        let matches: Vec<&Declaration> = self
            .ast()
            .declarations
            .iter()
            .filter(|decl| match decl {
                Declaration::Function(f) => f.name == old_name,
                Declaration::Variable(v) => v.name == old_name,
                Declaration::Alias(_) => false,
            })
            .collect();
        if matches.is_empty() {
            return Err(EditError::declaration_not_found(old_name));
        }
        if matches.len() > 1 {
            return Err(EditError::ambiguous(old_name));
        }

        let tokens = tokenize(self.text());
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        let mut in_import = false;
        // Inside a JSX tag (between `<` and `>`), only the tag name itself
        // is a reference; attribute names are skipped. Expression containers
        // inside the tag count as outside again.
        let mut in_tag = false;
        let mut container_depth = 0usize;
        for (i, (token, range)) in tokens.iter().enumerate() {
            match token {
                Token::Import => in_import = true,
                Token::Semi => in_import = false,
                Token::Str(_) if in_import => in_import = false,
                Token::Lt if container_depth == 0 => in_tag = true,
                Token::Gt if container_depth == 0 => in_tag = false,
                Token::LBrace if in_tag => container_depth += 1,
                Token::RBrace if in_tag && container_depth > 0 => container_depth -= 1,
                Token::Ident(name) if *name == old_name && !in_import => {
                    let prev = i.checked_sub(1).map(|p| tokens[p].0);
                    let after_dot = matches!(prev, Some(Token::Dot));
                    let object_key = tokens
                        .get(i + 1)
                        .is_some_and(|(t, _)| matches!(t, Token::Colon));
                    let attr_name = in_tag
                        && container_depth == 0
                        && !matches!(prev, Some(Token::Lt) | Some(Token::Slash));
                    if !after_dot && !object_key && !attr_name {
                        edits.push((range.clone(), new_name.to_string()));
                    }
                }
                _ => {}
            }
        }
        self.splice_all(edits)
    }

    /// Update or add one attribute. Updates preserve the attribute's line
    /// span, padding with blank lines when the new value is shorter, so
    /// sibling elements never shift.
    pub fn upsert_attribute(
        &mut self,
        line: u32,
        column: u32,
        name: &str,
        value: &Value,
    ) -> EditResult<()> {
        let id = self.element_at(line, column)?;
        let node = self.node(id)?.clone();
        let rendered = format_attr_value(value);

        if let Some(attr) = node.attribute(name) {
            let Some(value_span) = attr.value_span else {
                // Shorthand attribute; rewrite the whole thing
                let replacement = format!("{}={}", name, rendered);
                return self.splice(attr.span.start..attr.span.end, &replacement);
            };
            let old_lines = value_span.slice(self.text()).matches('\n').count();
            let new_lines = rendered.matches('\n').count();
            let padding = "\n".repeat(old_lines.saturating_sub(new_lines));
            let replacement = format!("{}{}", rendered, padding);
            return self.splice(value_span.start..value_span.end, &replacement);
        }

        // New attribute goes at the end of the opening tag
        let at = node.open_span.end - if node.self_closing { 2 } else { 1 };
        let before_is_space = self.text()[..at]
            .chars()
            .next_back()
            .map(|c| c.is_whitespace())
            .unwrap_or(false);
        let insert = if before_is_space {
            format!("{}={} ", name, rendered)
        } else {
            format!(" {}={}", name, rendered)
        };
        self.splice(at..at, &insert)
    }

    fn element_at(&self, line: u32, column: u32) -> EditResult<ElementId> {
        lookup_id(self.ast(), self.positions(), line, column)
            .ok_or(EditError::element_not_found(line, column))
    }

    fn node(&self, id: ElementId) -> EditResult<&ElementNode> {
        self.ast()
            .elements
            .get(id)
            .ok_or_else(|| EditError::invariant("element id out of range"))
    }

    fn export_root(&self, export_name: &str) -> EditResult<ElementId> {
        let decl = resolve_export(self.ast(), export_name)
            .ok_or_else(|| EditError::export_not_found(export_name))?;
        let root = match decl {
            Declaration::Function(f) => f.root,
            Declaration::Variable(v) => match &v.init {
                Initializer::Arrow { root, .. } => *root,
                _ => None,
            },
            Declaration::Alias(_) => None,
        };
        root.ok_or_else(|| EditError::missing_root(export_name))
    }

    /// Reuse an existing import binding for `(module, export_name)`, or
    /// synthesize a new statement with a collision-free local name.
    fn resolve_import_binding(
        &self,
        tag_hint: &str,
        module: &str,
        export_name: &str,
    ) -> (String, Option<(usize, String)>) {
        for import in &self.ast().imports {
            if import.module != module {
                continue;
            }
            if export_name == "default" {
                if let Some(local) = &import.default_name {
                    return (local.clone(), None);
                }
            }
            for named in &import.named {
                if named.export_name == export_name {
                    return (named.local_name.clone(), None);
                }
            }
        }

        let local = self.unique_local_name(tag_hint);
        let statement = if export_name == "default" {
            format!("import {} from \"{}\";", local, module)
        } else if local == export_name {
            format!("import {{ {} }} from \"{}\";", local, module)
        } else {
            format!("import {{ {} as {} }} from \"{}\";", export_name, local, module)
        };

        let (at, statement) = match self.ast().imports.last() {
            Some(last) => (last.span.end, format!("\n{}", statement)),
            None => (0, format!("{}\n", statement)),
        };
        (local, Some((at, statement)))
    }

    fn unique_local_name(&self, base: &str) -> String {
        let taken = |name: &str| -> bool {
            self.ast().find_declaration(name).is_some()
                || self.ast().find_import_binding(name).is_some()
        };
        if !taken(base) {
            return base.to_string();
        }
        let mut suffix = 1u32;
        loop {
            let candidate = format!("{}{}", base, suffix);
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Compute the splice that makes `element_text` the last child of
    /// `node`, converting a self-closing target to balanced tags. Returns
    /// `(range, replacement, offset-of-element-within-replacement)`.
    fn insertion_into(
        &self,
        node: &ElementNode,
        element_text: &str,
    ) -> EditResult<(Range<usize>, String, usize)> {
        if node.self_closing {
            let tag = node
                .tag_name()
                .ok_or_else(|| EditError::invariant("self-closing fragment"))?
                .to_string();
            let open = node.open_span.slice(self.text());
            let head = open.strip_suffix("/>").unwrap_or(open).trim_end();
            let base_indent = indent_at(self.text(), node.span.start);
            let child_indent = format!("{}  ", base_indent);
            let replacement = format!(
                "{}>\n{}{}\n{}</{}>",
                head, child_indent, element_text, base_indent, tag
            );
            let prefix = head.len() + 2 + child_indent.len();
            return Ok((node.span.start..node.span.end, replacement, prefix));
        }

        let close = node
            .close_span
            .ok_or_else(|| EditError::invariant("balanced element without close tag"))?;
        let line_start = self.text()[..close.start]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let close_alone_on_line = self.text()[line_start..close.start]
            .chars()
            .all(|c| c == ' ' || c == '\t');

        if close_alone_on_line {
            let base_indent = &self.text()[line_start..close.start];
            let replacement = format!("  {}\n{}", element_text, base_indent);
            Ok((close.start..close.start, replacement, 2))
        } else {
            Ok((close.start..close.start, element_text.to_string(), 0))
        }
    }
}

/// Render a new element tag with its initial attributes.
fn render_element(tag: &str, props: &serde_json::Map<String, Value>) -> String {
    let mut out = format!("<{}", tag);
    for (name, value) in props {
        out.push(' ');
        out.push_str(name);
        out.push('=');
        out.push_str(&format_attr_value(value));
    }
    out.push_str(" />");
    out
}

/// Render a JSON value as attribute source text: strings become string
/// attributes, everything else an expression container.
pub fn format_attr_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", escape_string(s)),
        other => format!("{{{}}}", render_expr(other)),
    }
}

fn render_expr(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else {
                match n.as_f64() {
                    // Whole-valued floats render without the trailing ".0"
                    Some(f) if f.fract() == 0.0 && f.is_finite() => (f as i64).to_string(),
                    _ => n.to_string(),
                }
            }
        }
        Value::String(s) => format!("\"{}\"", escape_string(s)),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(render_expr).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Object(_) => value.to_string(),
    }
}

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Leading whitespace of the line containing `offset`.
fn indent_at(text: &str, offset: usize) -> String {
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    text[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Byte range to remove when relocating an element: the element itself
/// plus its leading indentation and newline when it sits alone on its
/// line, so no blank line is left behind.
fn removal_range(text: &str, start: usize, end: usize) -> Range<usize> {
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    if text[line_start..start].chars().all(|c| c == ' ' || c == '\t') {
        let from = if line_start > 0 { line_start - 1 } else { 0 };
        from..end
    } else {
        start..end
    }
}
