//! Recursive-descent parser for scene source files.
//!
//! Works over the token vector produced by [`crate::tokenizer::tokenize`].
//! Statement bodies and expressions the editor never rewrites are consumed
//! as balanced opaque spans; JSX trees and type declarations are parsed
//! structurally.

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, Token};
use std::collections::BTreeMap;
use std::ops::Range;

/// Prefix that marks a soft-deleted element inside a JSX comment container.
pub const DELETED_PRAGMA_PREFIX: &str = "/*<deleted>";

/// Parse a complete document.
pub fn parse(source: &str) -> ParseResult<SceneDocument> {
    Parser::new(source).parse_document()
}

pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
    arena: ElementArena,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            tokens: tokenize(source),
            pos: 0,
            arena: ElementArena::new(),
        }
    }

    pub fn parse_document(&mut self) -> ParseResult<SceneDocument> {
        let mut doc = SceneDocument {
            imports: Vec::new(),
            declarations: Vec::new(),
            types: Vec::new(),
            elements: ElementArena::new(),
        };

        while !self.is_at_end() {
            match self.peek() {
                Some(Token::DocComment(_)) => {
                    // Top-level doc comments carry no structure for us
                    self.advance();
                }
                Some(Token::Import) => {
                    doc.imports.push(self.parse_import()?);
                }
                Some(Token::Export) => {
                    self.parse_export_item(&mut doc)?;
                }
                Some(Token::Function) => {
                    let decl = self.parse_function(ExportKind::None, self.current_start())?;
                    doc.declarations.push(Declaration::Function(decl));
                }
                Some(Token::Const) => {
                    let decl = self.parse_variable(ExportKind::None, self.current_start())?;
                    doc.declarations.push(Declaration::Variable(decl));
                }
                Some(Token::Type) => {
                    doc.types.push(self.parse_type_alias()?);
                }
                Some(Token::Interface) => {
                    doc.types.push(self.parse_interface()?);
                }
                Some(Token::Semi) => {
                    self.advance();
                }
                Some(other) => {
                    return Err(ParseError::invalid_syntax(
                        self.current_start(),
                        format!("Unexpected token at top level: {:?}", other),
                    ));
                }
                None => break,
            }
        }

        doc.elements = std::mem::take(&mut self.arena);
        Ok(doc)
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    fn parse_export_item(&mut self, doc: &mut SceneDocument) -> ParseResult<()> {
        let start = self.current_start();
        self.expect(Token::Export)?;

        match self.peek() {
            Some(Token::Default) => {
                self.advance();
                match self.peek() {
                    Some(Token::Function) => {
                        let decl = self.parse_function(ExportKind::Default, start)?;
                        doc.declarations.push(Declaration::Function(decl));
                    }
                    Some(Token::Ident(_)) => {
                        // `export default Name;` or `export default wrap(Name);`
                        let (first, _) = self.expect_ident()?;
                        let target = if self.match_token(Token::LParen) {
                            let (inner, _) = self.expect_ident()?;
                            self.expect(Token::RParen)?;
                            inner
                        } else {
                            first
                        };
                        self.match_token(Token::Semi);
                        let end = self.previous_end();
                        doc.declarations.push(Declaration::Alias(AliasDecl {
                            export_name: "default".to_string(),
                            target,
                            span: Span::new(start, end),
                        }));
                    }
                    _ => {
                        return Err(ParseError::invalid_syntax(
                            self.current_start(),
                            "Expected function or identifier after 'export default'",
                        ));
                    }
                }
            }
            Some(Token::Function) => {
                let decl = self.parse_function(ExportKind::Named, start)?;
                doc.declarations.push(Declaration::Function(decl));
            }
            Some(Token::Const) => {
                let decl = self.parse_variable(ExportKind::Named, start)?;
                doc.declarations.push(Declaration::Variable(decl));
            }
            Some(Token::Type) => {
                doc.types.push(self.parse_type_alias()?);
            }
            Some(Token::Interface) => {
                doc.types.push(self.parse_interface()?);
            }
            Some(Token::LBrace) => {
                // `export { Name }` / `export { Name as Alias }`
                self.advance();
                while !self.check(Token::RBrace) && !self.is_at_end() {
                    let (target, _) = self.expect_ident()?;
                    let export_name = if self.match_token(Token::As) {
                        self.expect_ident()?.0
                    } else {
                        target.clone()
                    };
                    let end = self.previous_end();
                    doc.declarations.push(Declaration::Alias(AliasDecl {
                        export_name,
                        target,
                        span: Span::new(start, end),
                    }));
                    if !self.check(Token::RBrace) {
                        self.expect(Token::Comma)?;
                    }
                }
                self.expect(Token::RBrace)?;
                self.match_token(Token::Semi);
            }
            _ => {
                return Err(ParseError::invalid_syntax(
                    self.current_start(),
                    "Unsupported export form",
                ));
            }
        }

        Ok(())
    }

    fn parse_import(&mut self) -> ParseResult<ImportDecl> {
        let start = self.current_start();
        self.expect(Token::Import)?;

        let mut default_name = None;
        let mut namespace = None;
        let mut named = Vec::new();

        let module = match self.peek() {
            Some(Token::Str(_)) => {
                // Side-effect import
                self.expect_string()?
            }
            _ => {
                match self.peek() {
                    Some(Token::Ident(_)) => {
                        default_name = Some(self.expect_ident()?.0);
                        if self.match_token(Token::Comma) {
                            self.parse_import_bindings(&mut namespace, &mut named)?;
                        }
                    }
                    _ => {
                        self.parse_import_bindings(&mut namespace, &mut named)?;
                    }
                }
                self.expect(Token::From)?;
                self.expect_string()?
            }
        };

        self.match_token(Token::Semi);
        let end = self.previous_end();

        Ok(ImportDecl {
            module,
            default_name,
            namespace,
            named,
            span: Span::new(start, end),
        })
    }

    fn parse_import_bindings(
        &mut self,
        namespace: &mut Option<String>,
        named: &mut Vec<NamedImport>,
    ) -> ParseResult<()> {
        match self.peek() {
            Some(Token::Star) => {
                self.advance();
                self.expect(Token::As)?;
                *namespace = Some(self.expect_ident()?.0);
            }
            Some(Token::LBrace) => {
                self.advance();
                while !self.check(Token::RBrace) && !self.is_at_end() {
                    let (export_name, _) = self.expect_ident()?;
                    let local_name = if self.match_token(Token::As) {
                        self.expect_ident()?.0
                    } else {
                        export_name.clone()
                    };
                    named.push(NamedImport {
                        export_name,
                        local_name,
                    });
                    if !self.check(Token::RBrace) {
                        self.expect(Token::Comma)?;
                    }
                }
                self.expect(Token::RBrace)?;
            }
            _ => {
                return Err(ParseError::invalid_syntax(
                    self.current_start(),
                    "Expected import bindings",
                ));
            }
        }
        Ok(())
    }

    fn parse_function(&mut self, export: ExportKind, start: usize) -> ParseResult<FunctionDecl> {
        self.expect(Token::Function)?;
        let (name, name_span) = self.expect_ident()?;

        self.expect(Token::LParen)?;
        let props_param = self.parse_props_param()?;
        self.expect(Token::RParen)?;

        // Return type annotation, parsed and discarded
        if self.match_token(Token::Colon) {
            self.parse_type_expr()?;
        }

        let (body_span, root) = self.parse_braced_body()?;

        Ok(FunctionDecl {
            name,
            export,
            props_param,
            body_span,
            root,
            span: Span::new(start, body_span.end),
            name_span,
        })
    }

    fn parse_variable(&mut self, export: ExportKind, start: usize) -> ParseResult<VariableDecl> {
        self.expect(Token::Const)?;
        let (name, name_span) = self.expect_ident()?;

        if self.match_token(Token::Colon) {
            self.parse_type_expr()?;
        }
        self.expect(Token::Eq)?;

        let init = self.parse_initializer()?;
        self.match_token(Token::Semi);
        let end = self.previous_end();

        Ok(VariableDecl {
            name,
            export,
            init,
            span: Span::new(start, end),
            name_span,
        })
    }

    fn parse_initializer(&mut self) -> ParseResult<Initializer> {
        match self.peek() {
            Some(Token::LParen) => {
                // Arrow function: `(params) => body`
                self.advance();
                let props_param = self.parse_props_param()?;
                self.expect(Token::RParen)?;
                if self.match_token(Token::Colon) {
                    self.parse_type_expr()?;
                }
                self.expect(Token::Arrow)?;

                match self.peek() {
                    Some(Token::LBrace) => {
                        let (body_span, root) = self.parse_braced_body()?;
                        Ok(Initializer::Arrow {
                            props_param,
                            root,
                            body_span,
                        })
                    }
                    Some(Token::LParen) => {
                        let open = self.current_start();
                        self.advance();
                        if self.check(Token::Lt) {
                            let root = self.parse_jsx_node(None)?;
                            self.expect(Token::RParen)?;
                            let end = self.previous_end();
                            Ok(Initializer::Arrow {
                                props_param,
                                root: Some(root),
                                body_span: Span::new(open, end),
                            })
                        } else {
                            let end = self.skip_balanced_from(Token::LParen, Token::RParen, open)?;
                            Ok(Initializer::Arrow {
                                props_param,
                                root: None,
                                body_span: Span::new(open, end),
                            })
                        }
                    }
                    Some(Token::Lt) => {
                        let open = self.current_start();
                        let root = self.parse_jsx_node(None)?;
                        let end = self.previous_end();
                        Ok(Initializer::Arrow {
                            props_param,
                            root: Some(root),
                            body_span: Span::new(open, end),
                        })
                    }
                    _ => {
                        let open = self.current_start();
                        let end = self.skip_opaque_expression()?;
                        Ok(Initializer::Arrow {
                            props_param,
                            root: None,
                            body_span: Span::new(open, end),
                        })
                    }
                }
            }
            Some(Token::Ident(_)) => {
                let start = self.current_start();
                let (first, _) = self.parse_dotted_name()?;
                if self.match_token(Token::LParen) {
                    if let Some(Token::Ident(_)) = self.peek() {
                        let (argument, _) = self.expect_ident()?;
                        if self.match_token(Token::RParen) {
                            return Ok(Initializer::Call {
                                callee: first,
                                argument,
                            });
                        }
                    }
                    // Unrecognized call shape
                    self.skip_balanced_tail(Token::LParen, Token::RParen)?;
                    let end = self.skip_opaque_expression()?;
                    return Ok(Initializer::Opaque(Span::new(start, end)));
                }
                if self.check(Token::Semi) || self.is_at_end() {
                    return Ok(Initializer::Literal(ValueExpr::Identifier(first)));
                }
                // Expression we do not interpret
                let end = self.skip_opaque_expression()?;
                Ok(Initializer::Opaque(Span::new(start, end)))
            }
            Some(Token::Number(_))
            | Some(Token::Minus)
            | Some(Token::Str(_))
            | Some(Token::True)
            | Some(Token::False)
            | Some(Token::LBracket) => {
                let value = self.parse_value_expr()?;
                Ok(Initializer::Literal(value))
            }
            _ => {
                let start = self.current_start();
                let end = self.skip_opaque_expression()?;
                Ok(Initializer::Opaque(Span::new(start, end)))
            }
        }
    }

    /// Consume tokens up to (not including) a top-level `;` or EOF.
    fn skip_opaque_expression(&mut self) -> ParseResult<usize> {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token {
                Token::LBrace | Token::LParen | Token::LBracket => depth += 1,
                Token::RBrace | Token::RParen | Token::RBracket => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Token::Semi if depth == 0 => break,
                _ => {}
            }
            self.advance();
        }
        Ok(self.previous_end())
    }

    // ------------------------------------------------------------------
    // Params & values
    // ------------------------------------------------------------------

    fn parse_props_param(&mut self) -> ParseResult<Option<PropsParam>> {
        if self.check(Token::RParen) {
            return Ok(None);
        }
        let start = self.current_start();

        let (ident, bindings) = match self.peek() {
            Some(Token::LBrace) => {
                self.advance();
                let mut bindings = Vec::new();
                while !self.check(Token::RBrace) && !self.is_at_end() {
                    if self.match_token(Token::Spread) {
                        let _ = self.expect_ident()?;
                    } else {
                        let (name, _) = self.expect_ident()?;
                        let default = if self.match_token(Token::Eq) {
                            Some(self.parse_value_expr()?)
                        } else {
                            None
                        };
                        bindings.push(ParamBinding { name, default });
                    }
                    if !self.check(Token::RBrace) {
                        self.expect(Token::Comma)?;
                    }
                }
                self.expect(Token::RBrace)?;
                (None, bindings)
            }
            Some(Token::Ident(_)) => {
                let (name, _) = self.expect_ident()?;
                (Some(name), Vec::new())
            }
            _ => {
                return Err(ParseError::invalid_syntax(
                    start,
                    "Expected parameter binding",
                ));
            }
        };

        let type_ann = if self.match_token(Token::Colon) {
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        // Trailing parameters are not interpreted
        if self.match_token(Token::Comma) {
            let mut depth = 0usize;
            while let Some(token) = self.peek() {
                match token {
                    Token::LParen | Token::LBrace | Token::LBracket => depth += 1,
                    Token::RParen if depth == 0 => break,
                    Token::RParen | Token::RBrace | Token::RBracket => depth -= 1,
                    _ => {}
                }
                self.advance();
            }
        }

        let end = self.previous_end();
        Ok(Some(PropsParam {
            ident,
            bindings,
            type_ann,
            span: Span::new(start, end),
        }))
    }

    fn parse_value_expr(&mut self) -> ParseResult<ValueExpr> {
        match self.peek() {
            Some(Token::Number(text)) => {
                let text = text.to_string();
                self.advance();
                let value = text.parse::<f64>().map_err(|_| {
                    ParseError::invalid_syntax(self.previous_end(), "Invalid number literal")
                })?;
                Ok(ValueExpr::Number(value))
            }
            Some(Token::Minus) => {
                self.advance();
                match self.parse_value_expr()? {
                    ValueExpr::Number(n) => Ok(ValueExpr::Number(-n)),
                    _ => Err(ParseError::invalid_syntax(
                        self.previous_end(),
                        "Expected number after '-'",
                    )),
                }
            }
            Some(Token::Str(_)) => {
                let value = self.expect_string()?;
                Ok(ValueExpr::String(value))
            }
            Some(Token::True) => {
                self.advance();
                Ok(ValueExpr::Bool(true))
            }
            Some(Token::False) => {
                self.advance();
                Ok(ValueExpr::Bool(false))
            }
            Some(Token::LBracket) => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(Token::RBracket) && !self.is_at_end() {
                    items.push(self.parse_value_expr()?);
                    if !self.check(Token::RBracket) {
                        self.expect(Token::Comma)?;
                    }
                }
                self.expect(Token::RBracket)?;
                Ok(ValueExpr::Array(items))
            }
            Some(Token::Ident(_)) => {
                let (name, _) = self.parse_dotted_name()?;
                Ok(ValueExpr::Identifier(name))
            }
            _ => Err(ParseError::invalid_syntax(
                self.current_start(),
                "Expected value expression",
            )),
        }
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type_alias(&mut self) -> ParseResult<TypeDecl> {
        let start = self.current_start();
        self.expect(Token::Type)?;
        let (name, _) = self.expect_ident()?;
        self.expect(Token::Eq)?;
        let ty = self.parse_type_expr()?;
        self.match_token(Token::Semi);
        let end = self.previous_end();

        Ok(TypeDecl {
            name,
            ty,
            span: Span::new(start, end),
        })
    }

    fn parse_interface(&mut self) -> ParseResult<TypeDecl> {
        let start = self.current_start();
        self.expect(Token::Interface)?;
        let (name, _) = self.expect_ident()?;
        self.expect(Token::LBrace)?;
        let properties = self.parse_object_type_body()?;
        let end = self.previous_end();

        Ok(TypeDecl {
            name,
            ty: TypeExpr::Object(properties),
            span: Span::new(start, end),
        })
    }

    pub fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        // Leading `|` is legal in union declarations
        self.match_token(Token::Pipe);

        let mut members = vec![self.parse_type_primary()?];
        while self.match_token(Token::Pipe) {
            members.push(self.parse_type_primary()?);
        }

        if members.len() == 1 {
            Ok(members.pop().unwrap())
        } else {
            Ok(TypeExpr::Union(members))
        }
    }

    fn parse_type_primary(&mut self) -> ParseResult<TypeExpr> {
        let start = self.current_start();
        let mut ty = match self.peek() {
            Some(Token::Ident("number")) => {
                self.advance();
                TypeExpr::Number
            }
            Some(Token::Ident("string")) => {
                self.advance();
                TypeExpr::String
            }
            Some(Token::Ident("boolean")) => {
                self.advance();
                TypeExpr::Boolean
            }
            Some(Token::Ident(_)) => {
                let (name, span) = self.parse_dotted_name()?;
                TypeExpr::Ref {
                    name,
                    text: self.source[span.start..span.end].to_string(),
                }
            }
            Some(Token::Typeof) => {
                self.advance();
                let (name, span) = self.parse_dotted_name()?;
                TypeExpr::TypeofRef {
                    name,
                    text: self.source[start..span.end].to_string(),
                }
            }
            Some(Token::Str(_)) => {
                let value = self.expect_string()?;
                TypeExpr::LiteralString(value)
            }
            Some(Token::Number(_)) | Some(Token::Minus) => match self.parse_value_expr()? {
                ValueExpr::Number(n) => TypeExpr::LiteralNumber(n),
                _ => {
                    return Err(ParseError::invalid_syntax(start, "Expected numeric literal"));
                }
            },
            Some(Token::True) => {
                self.advance();
                TypeExpr::LiteralBoolean(true)
            }
            Some(Token::False) => {
                self.advance();
                TypeExpr::LiteralBoolean(false)
            }
            Some(Token::LBracket) => {
                self.advance();
                let mut members = Vec::new();
                while !self.check(Token::RBracket) && !self.is_at_end() {
                    members.push(self.parse_tuple_member()?);
                    if !self.check(Token::RBracket) {
                        self.expect(Token::Comma)?;
                    }
                }
                self.expect(Token::RBracket)?;
                TypeExpr::Tuple(members)
            }
            Some(Token::LBrace) => {
                self.advance();
                TypeExpr::Object(self.parse_object_type_body()?)
            }
            Some(Token::LParen) => {
                if self.is_function_type_ahead() {
                    // `(args) => T`, not interpretable as a prop schema
                    self.skip_balanced_from(Token::LParen, Token::RParen, start)?;
                    self.expect(Token::Arrow)?;
                    self.parse_type_primary()?;
                    TypeExpr::Unhandled {
                        text: self.source[start..self.previous_end()].to_string(),
                    }
                } else {
                    self.advance();
                    let inner = self.parse_type_expr()?;
                    self.expect(Token::RParen)?;
                    inner
                }
            }
            _ => {
                let end = self.skip_unhandled_type()?;
                TypeExpr::Unhandled {
                    text: self.source[start..end].to_string(),
                }
            }
        };

        // Postfix forms the editor does not interpret
        loop {
            if self.check(Token::LBracket) && self.check_at(1, Token::RBracket) {
                self.advance();
                self.advance();
                ty = TypeExpr::Unhandled {
                    text: self.source[start..self.previous_end()].to_string(),
                };
            } else if self.check(Token::Lt) {
                let open = self.current_start();
                self.skip_balanced_from(Token::Lt, Token::Gt, open)?;
                ty = TypeExpr::Unhandled {
                    text: self.source[start..self.previous_end()].to_string(),
                };
            } else {
                break;
            }
        }

        Ok(ty)
    }

    fn parse_tuple_member(&mut self) -> ParseResult<TupleMember> {
        // Labeled member: `x: number` or `x?: number`
        if let Some(Token::Ident(_)) = self.peek() {
            let labeled = match (self.peek_at(1), self.peek_at(2)) {
                (Some(Token::Colon), _) => true,
                (Some(Token::Question), Some(Token::Colon)) => true,
                _ => false,
            };
            if labeled {
                let (label, _) = self.expect_ident()?;
                let optional = self.match_token(Token::Question);
                self.expect(Token::Colon)?;
                let ty = self.parse_type_expr()?;
                return Ok(TupleMember {
                    label: Some(label),
                    optional,
                    ty,
                });
            }
        }

        let ty = self.parse_type_expr()?;
        Ok(TupleMember {
            label: None,
            optional: false,
            ty,
        })
    }

    fn parse_object_type_body(&mut self) -> ParseResult<Vec<PropertySig>> {
        let mut properties = Vec::new();

        while !self.check(Token::RBrace) && !self.is_at_end() {
            let (description, tags) = match self.peek() {
                Some(Token::DocComment(text)) => {
                    let parsed = parse_doc_comment(text);
                    self.advance();
                    parsed
                }
                _ => (None, BTreeMap::new()),
            };

            let name = match self.peek() {
                Some(Token::Str(_)) => self.expect_string()?,
                _ => self.expect_ident()?.0,
            };
            let optional = self.match_token(Token::Question);
            self.expect(Token::Colon)?;
            let ty = self.parse_type_expr()?;
            self.match_token(Token::Semi);
            self.match_token(Token::Comma);

            properties.push(PropertySig {
                name,
                optional,
                ty,
                description,
                tags,
            });
        }
        self.expect(Token::RBrace)?;

        Ok(properties)
    }

    /// True when the cursor sits on `(` whose matching `)` is followed by `=>`.
    fn is_function_type_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some((token, _)) = self.tokens.get(i) {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(i + 1).map(|(t, _)| t),
                            Some(Token::Arrow)
                        );
                    }
                }
                _ => {}
            }
            i += 1;
        }
        false
    }

    /// Consume an unrecognized type form as a balanced opaque span.
    fn skip_unhandled_type(&mut self) -> ParseResult<usize> {
        let start = self.current_start();
        let mut depth = 0usize;
        let mut consumed = false;

        while let Some(token) = self.peek() {
            match token {
                Token::LParen | Token::LBrace | Token::LBracket => depth += 1,
                Token::RParen | Token::RBrace | Token::RBracket => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Token::Pipe | Token::Semi | Token::Comma | Token::Eq | Token::Gt
                    if depth == 0 =>
                {
                    break
                }
                _ => {}
            }
            self.advance();
            consumed = true;
        }

        if !consumed {
            return Err(ParseError::invalid_syntax(start, "Expected type expression"));
        }
        Ok(self.previous_end())
    }

    // ------------------------------------------------------------------
    // Function bodies & JSX
    // ------------------------------------------------------------------

    /// Parse `{ ... }`, capturing the JSX root of the first top-level
    /// `return` statement if one exists.
    fn parse_braced_body(&mut self) -> ParseResult<(Span, Option<ElementId>)> {
        let open = self.current_start();
        self.expect(Token::LBrace)?;

        let mut depth = 1usize;
        let mut root = None;

        while depth > 0 {
            match self.peek() {
                Some(Token::LBrace) => {
                    depth += 1;
                    self.advance();
                }
                Some(Token::RBrace) => {
                    depth -= 1;
                    self.advance();
                }
                Some(Token::Return) if depth == 1 && root.is_none() => {
                    self.advance();
                    let parenthesized = self.match_token(Token::LParen);
                    if self.check(Token::Lt) {
                        root = Some(self.parse_jsx_node(None)?);
                        if parenthesized {
                            self.expect(Token::RParen)?;
                        }
                    } else if parenthesized {
                        self.skip_balanced_tail(Token::LParen, Token::RParen)?;
                    }
                }
                Some(_) => {
                    self.advance();
                }
                None => {
                    return Err(ParseError::unexpected_eof(self.source.len()));
                }
            }
        }

        let end = self.previous_end();
        Ok((Span::new(open, end), root))
    }

    /// Skip to the close matching an already-consumed opening delimiter.
    fn skip_balanced_tail(&mut self, open: Token<'src>, close: Token<'src>) -> ParseResult<usize> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                Some(t) if t == open => depth += 1,
                Some(t) if t == close => depth -= 1,
                Some(_) => {}
                None => return Err(ParseError::unexpected_eof(self.source.len())),
            }
            self.advance();
        }
        Ok(self.previous_end())
    }

    /// Expect `open` at the cursor and skip through its matching `close`.
    fn skip_balanced_from(
        &mut self,
        open: Token<'src>,
        close: Token<'src>,
        start: usize,
    ) -> ParseResult<usize> {
        if !self.match_token(open) {
            return Err(ParseError::invalid_syntax(start, "Expected opening delimiter"));
        }
        self.skip_balanced_tail(open, close)
    }

    /// Parse an element or fragment at `<`.
    fn parse_jsx_node(&mut self, parent: Option<ElementId>) -> ParseResult<ElementId> {
        let start = self.current_start();
        self.expect(Token::Lt)?;

        if self.check(Token::Gt) {
            // Fragment
            self.advance();
            let open_span = Span::new(start, self.previous_end());
            let id = self.arena.alloc(ElementNode {
                parent,
                kind: ElementKind::Fragment,
                attributes: Vec::new(),
                children: Vec::new(),
                span: open_span,
                open_span,
                close_span: None,
                self_closing: false,
            });

            let children = self.parse_jsx_children(id)?;

            // `</>`
            let close_start = self.current_start();
            self.expect(Token::Lt)?;
            self.expect(Token::Slash)?;
            self.expect(Token::Gt)?;
            let close_span = Span::new(close_start, self.previous_end());

            let node = self
                .arena
                .get_mut(id)
                .ok_or_else(|| ParseError::invalid_syntax(start, "Arena invariant broken"))?;
            node.children = children;
            node.close_span = Some(close_span);
            node.span = Span::new(start, close_span.end);
            return Ok(id);
        }

        let (name, _) = self.parse_dotted_name()?;
        let attributes = self.parse_jsx_attributes()?;

        if self.match_token(Token::Slash) {
            self.expect(Token::Gt)?;
            let span = Span::new(start, self.previous_end());
            return Ok(self.arena.alloc(ElementNode {
                parent,
                kind: ElementKind::Tag { name },
                attributes,
                children: Vec::new(),
                span,
                open_span: span,
                close_span: None,
                self_closing: true,
            }));
        }

        self.expect(Token::Gt)?;
        let open_span = Span::new(start, self.previous_end());
        let id = self.arena.alloc(ElementNode {
            parent,
            kind: ElementKind::Tag { name: name.clone() },
            attributes,
            children: Vec::new(),
            span: open_span,
            open_span,
            close_span: None,
            self_closing: false,
        });

        let children = self.parse_jsx_children(id)?;

        let close_start = self.current_start();
        self.expect(Token::Lt)?;
        self.expect(Token::Slash)?;
        let (close_name, _) = self.parse_dotted_name()?;
        self.expect(Token::Gt)?;
        let close_span = Span::new(close_start, self.previous_end());

        if close_name != name {
            return Err(ParseError::MismatchedTag {
                pos: close_start,
                opened: name,
                closed: close_name,
            });
        }

        let node = self
            .arena
            .get_mut(id)
            .ok_or_else(|| ParseError::invalid_syntax(start, "Arena invariant broken"))?;
        node.children = children;
        node.close_span = Some(close_span);
        node.span = Span::new(start, close_span.end);
        Ok(id)
    }

    /// Parse children up to (not including) the `</` of the parent.
    fn parse_jsx_children(&mut self, parent: ElementId) -> ParseResult<Vec<JsxChild>> {
        let mut children = Vec::new();

        loop {
            match self.peek() {
                Some(Token::Lt) => {
                    if self.check_at(1, Token::Slash) {
                        return Ok(children);
                    }
                    let child = self.parse_jsx_node(Some(parent))?;
                    children.push(JsxChild::Element(child));
                }
                Some(Token::LBrace) => {
                    let start = self.current_start();
                    let end = self.skip_balanced_from(Token::LBrace, Token::RBrace, start)?;
                    let span = Span::new(start, end);
                    let inner = self.source[start + 1..end - 1].trim();
                    if inner.starts_with(DELETED_PRAGMA_PREFIX) {
                        children.push(JsxChild::DeletedPragma(span));
                    } else {
                        children.push(JsxChild::Expression(span));
                    }
                }
                Some(_) => {
                    // Opaque text run: everything up to the next `<` or `{`
                    let start = self.current_start();
                    while let Some(token) = self.peek() {
                        match token {
                            Token::Lt | Token::LBrace => break,
                            _ => {
                                self.advance();
                            }
                        }
                    }
                    children.push(JsxChild::Text(Span::new(start, self.previous_end())));
                }
                None => {
                    return Err(ParseError::unexpected_eof(self.source.len()));
                }
            }
        }
    }

    fn parse_jsx_attributes(&mut self) -> ParseResult<Vec<JsxAttribute>> {
        let mut attributes = Vec::new();

        loop {
            let name = match self.peek() {
                Some(Token::Ident(_)) => self.expect_ident()?,
                // Attribute names may shadow keywords (`type`, `default`)
                Some(Token::Type) => {
                    let span = self.current_span();
                    self.advance();
                    ("type".to_string(), span)
                }
                Some(Token::Default) => {
                    let span = self.current_span();
                    self.advance();
                    ("default".to_string(), span)
                }
                _ => return Ok(attributes),
            };
            let (name, name_span) = name;

            let (value, value_span) = if self.match_token(Token::Eq) {
                match self.peek() {
                    Some(Token::Str(_)) => {
                        let span = self.current_span();
                        let value = self.expect_string()?;
                        (Some(AttrValue::String(value)), Some(span))
                    }
                    Some(Token::LBrace) => {
                        let start = self.current_start();
                        self.advance();
                        let checkpoint = self.pos;
                        let parsed = self.parse_value_expr();
                        let value = match parsed {
                            Ok(value) if self.check(Token::RBrace) => {
                                self.advance();
                                value
                            }
                            _ => {
                                self.pos = checkpoint;
                                let end = self.skip_balanced_tail(Token::LBrace, Token::RBrace)?;
                                ValueExpr::Opaque(
                                    self.source[start + 1..end - 1].trim().to_string(),
                                )
                            }
                        };
                        let span = Span::new(start, self.previous_end());
                        (Some(AttrValue::Expression(value)), Some(span))
                    }
                    _ => {
                        return Err(ParseError::invalid_syntax(
                            self.current_start(),
                            "Expected attribute value",
                        ));
                    }
                }
            } else {
                (None, None)
            };

            let end = value_span.map(|s| s.end).unwrap_or(name_span.end);
            attributes.push(JsxAttribute {
                name,
                value,
                span: Span::new(name_span.start, end),
                value_span,
            });
        }
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn peek_at(&self, offset: usize) -> Option<Token<'src>> {
        self.tokens.get(self.pos + offset).map(|(t, _)| *t)
    }

    fn check(&self, token: Token<'src>) -> bool {
        self.peek() == Some(token)
    }

    fn check_at(&self, offset: usize, token: Token<'src>) -> bool {
        self.peek_at(offset) == Some(token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn match_token(&mut self, token: Token<'src>) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token<'src>) -> ParseResult<()> {
        if self.match_token(token) {
            Ok(())
        } else {
            Err(ParseError::unexpected_token(
                self.current_start(),
                format!("{:?}", token),
                format!("{:?}", self.peek()),
            ))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<(String, Span)> {
        match self.tokens.get(self.pos) {
            Some((Token::Ident(name), range)) => {
                let result = (name.to_string(), Span::new(range.start, range.end));
                self.advance();
                Ok(result)
            }
            Some((other, range)) => Err(ParseError::unexpected_token(
                range.start,
                "identifier",
                format!("{:?}", other),
            )),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }

    fn expect_string(&mut self) -> ParseResult<String> {
        match self.tokens.get(self.pos) {
            Some((Token::Str(raw), _)) => {
                let value = unquote(raw);
                self.advance();
                Ok(value)
            }
            Some((other, range)) => Err(ParseError::unexpected_token(
                range.start,
                "string literal",
                format!("{:?}", other),
            )),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }

    /// `Name` or `NS.Name` (arbitrary depth).
    fn parse_dotted_name(&mut self) -> ParseResult<(String, Span)> {
        let (mut name, start_span) = self.expect_ident()?;
        let mut end = start_span.end;
        while self.check(Token::Dot) {
            self.advance();
            let (part, span) = self.expect_ident()?;
            name.push('.');
            name.push_str(&part);
            end = span.end;
        }
        Ok((name, Span::new(start_span.start, end)))
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, range)) => Span::new(range.start, range.end),
            None => Span::new(self.source.len(), self.source.len()),
        }
    }

    fn current_start(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, r)| r.start)
            .unwrap_or(self.source.len())
    }

    fn previous_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens
                .get(self.pos - 1)
                .map(|(_, r)| r.end)
                .unwrap_or(self.source.len())
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

/// Strip quotes and resolve simple escapes.
fn unquote(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a JSDoc block into a description and `@tag value` entries.
pub fn parse_doc_comment(text: &str) -> (Option<String>, BTreeMap<String, String>) {
    let body = text
        .trim_start_matches("/**")
        .trim_end_matches("*/")
        .trim();

    let mut description_lines = Vec::new();
    let mut tags = BTreeMap::new();

    for line in body.lines() {
        let line = line.trim().trim_start_matches('*').trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('@') {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let tag = parts.next().unwrap_or_default().to_string();
            let value = parts.next().unwrap_or_default().trim().to_string();
            if !tag.is_empty() {
                tags.insert(tag, value);
            }
        } else {
            description_lines.push(line.to_string());
        }
    }

    let description = if description_lines.is_empty() {
        None
    } else {
        Some(description_lines.join("\n"))
    };
    (description, tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_imports() {
        let doc = parse(
            r#"
import Box1 from "./box";
import { Sphere, Torus as Donut } from "./shapes";
import * as Drei from "@react-three/drei";
"#,
        )
        .unwrap();

        assert_eq!(doc.imports.len(), 3);
        assert_eq!(doc.imports[0].default_name.as_deref(), Some("Box1"));
        assert_eq!(doc.imports[0].module, "./box");
        assert_eq!(doc.imports[1].named.len(), 2);
        assert_eq!(doc.imports[1].named[1].local_name, "Donut");
        assert_eq!(doc.imports[1].named[1].export_name, "Torus");
        assert_eq!(doc.imports[2].namespace.as_deref(), Some("Drei"));
    }

    #[test]
    fn test_parse_default_export_function_with_jsx() {
        let doc = parse(
            "export default function Scene() {\n  return (\n    <>\n      <mesh />\n    </>\n  );\n}\n",
        )
        .unwrap();

        let decl = doc.find_export("default").unwrap();
        let func = match decl {
            Declaration::Function(f) => f,
            _ => panic!("expected function"),
        };
        assert_eq!(func.name, "Scene");
        let root = doc.elements.get(func.root.unwrap()).unwrap();
        assert_eq!(root.kind, ElementKind::Fragment);
        assert_eq!(root.children.len(), 1);
        match &root.children[0] {
            JsxChild::Element(id) => {
                let mesh = doc.elements.get(*id).unwrap();
                assert_eq!(mesh.tag_name(), Some("mesh"));
                assert!(mesh.self_closing);
                assert!(mesh.is_host());
            }
            other => panic!("expected element child, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_attributes() {
        let doc = parse(
            r#"export default function S() { return <mesh name="floor" position={[1, 2, 3]} visible scale={2} />; }"#,
        )
        .unwrap();

        let func = match doc.find_export("default").unwrap() {
            Declaration::Function(f) => f,
            _ => panic!(),
        };
        let mesh = doc.elements.get(func.root.unwrap()).unwrap();
        assert_eq!(mesh.attributes.len(), 4);
        assert_eq!(
            mesh.attribute("name").unwrap().value,
            Some(AttrValue::String("floor".to_string()))
        );
        assert_eq!(
            mesh.attribute("position").unwrap().value,
            Some(AttrValue::Expression(ValueExpr::Array(vec![
                ValueExpr::Number(1.0),
                ValueExpr::Number(2.0),
                ValueExpr::Number(3.0),
            ])))
        );
        assert_eq!(mesh.attribute("visible").unwrap().value, None);
    }

    #[test]
    fn test_parse_nested_elements_with_children() {
        let doc = parse(
            "export default function S() { return <group><mesh /><Box /></group>; }",
        )
        .unwrap();

        let func = match doc.find_export("default").unwrap() {
            Declaration::Function(f) => f,
            _ => panic!(),
        };
        let group = doc.elements.get(func.root.unwrap()).unwrap();
        assert_eq!(group.tag_name(), Some("group"));
        assert_eq!(group.children.len(), 2);
        assert!(!group.self_closing);
        assert!(group.close_span.is_some());

        let second = match &group.children[1] {
            JsxChild::Element(id) => doc.elements.get(*id).unwrap(),
            _ => panic!(),
        };
        assert_eq!(second.tag_name(), Some("Box"));
        assert!(!second.is_host());
        assert_eq!(second.parent, func.root);
    }

    #[test]
    fn test_parse_type_alias_union_and_tuple() {
        let doc = parse(
            "type Props = { size?: number | [x: number, y: number, z: number]; color: \"red\" | \"blue\" };",
        )
        .unwrap();

        let decl = doc.find_type("Props").unwrap();
        let props = match &decl.ty {
            TypeExpr::Object(props) => props,
            _ => panic!(),
        };
        assert_eq!(props.len(), 2);
        assert!(props[0].optional);
        match &props[0].ty {
            TypeExpr::Union(members) => {
                assert_eq!(members[0], TypeExpr::Number);
                match &members[1] {
                    TypeExpr::Tuple(tuple) => {
                        assert_eq!(tuple.len(), 3);
                        assert_eq!(tuple[0].label.as_deref(), Some("x"));
                    }
                    _ => panic!(),
                }
            }
            _ => panic!(),
        }
        match &props[1].ty {
            TypeExpr::Union(members) => {
                assert_eq!(members[0], TypeExpr::LiteralString("red".to_string()));
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_parse_interface_with_doc_comments() {
        let doc = parse(
            r#"
interface BoxProps {
  /**
   * Width of the box.
   * @min 0
   */
  width?: number;
}
"#,
        )
        .unwrap();

        let props = match &doc.find_type("BoxProps").unwrap().ty {
            TypeExpr::Object(props) => props,
            _ => panic!(),
        };
        assert_eq!(props[0].description.as_deref(), Some("Width of the box."));
        assert_eq!(props[0].tags.get("min").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_parse_destructured_defaults() {
        let doc = parse(
            r#"export default function S({ scale = 1, color = "red", position = [0, 0, 0] }: Props) { return <mesh />; }"#,
        )
        .unwrap();

        let func = match doc.find_export("default").unwrap() {
            Declaration::Function(f) => f,
            _ => panic!(),
        };
        let param = func.props_param.as_ref().unwrap();
        assert_eq!(param.bindings.len(), 3);
        assert_eq!(param.bindings[0].default, Some(ValueExpr::Number(1.0)));
        assert_eq!(
            param.bindings[2].default,
            Some(ValueExpr::Array(vec![
                ValueExpr::Number(0.0),
                ValueExpr::Number(0.0),
                ValueExpr::Number(0.0),
            ]))
        );
        match param.type_ann.as_ref().unwrap() {
            TypeExpr::Ref { name, .. } => assert_eq!(name, "Props"),
            _ => panic!(),
        }
    }

    #[test]
    fn test_parse_alias_and_wrapped_default_export() {
        let doc = parse(
            "function Scene() { return <mesh />; }\nexport default memo(Scene);\n",
        )
        .unwrap();

        match doc.find_export("default").unwrap() {
            Declaration::Alias(alias) => {
                assert_eq!(alias.target, "Scene");
            }
            _ => panic!(),
        }
        assert!(doc.find_declaration("Scene").is_some());
    }

    #[test]
    fn test_parse_arrow_component() {
        let doc = parse("export const Box = ({ width = 1 }) => <mesh scale={width} />;").unwrap();

        match doc.find_export("Box").unwrap() {
            Declaration::Variable(v) => match &v.init {
                Initializer::Arrow { root, .. } => assert!(root.is_some()),
                _ => panic!(),
            },
            _ => panic!(),
        }
    }

    #[test]
    fn test_parse_const_literal_for_enum_labels() {
        let doc = parse("export const FRONT = 0;\nexport const BACK = 1;\n").unwrap();
        match doc.find_declaration("FRONT").unwrap() {
            Declaration::Variable(v) => {
                assert_eq!(v.init, Initializer::Literal(ValueExpr::Number(0.0)));
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_deleted_pragma_hidden_from_children() {
        let doc = parse(
            "export default function S() { return <group>{/*<deleted><mesh /> </deleted>*/}<Box /></group>; }",
        )
        .unwrap();

        let func = match doc.find_export("default").unwrap() {
            Declaration::Function(f) => f,
            _ => panic!(),
        };
        let group = doc.elements.get(func.root.unwrap()).unwrap();
        assert_eq!(group.children.len(), 2);
        assert!(matches!(group.children[0], JsxChild::DeletedPragma(_)));
        assert!(matches!(group.children[1], JsxChild::Element(_)));
    }

    #[test]
    fn test_mismatched_close_tag_is_error() {
        let err = parse("export default function S() { return <group></mesh>; }").unwrap_err();
        assert!(matches!(err, ParseError::MismatchedTag { .. }));
    }

    #[test]
    fn test_typeof_reference() {
        let doc = parse("type Side = typeof FRONT | typeof BACK;").unwrap();
        match &doc.find_type("Side").unwrap().ty {
            TypeExpr::Union(members) => match &members[0] {
                TypeExpr::TypeofRef { name, text } => {
                    assert_eq!(name, "FRONT");
                    assert_eq!(text, "typeof FRONT");
                }
                _ => panic!(),
            },
            _ => panic!(),
        }
    }
}
