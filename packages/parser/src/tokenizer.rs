//! Tokenizer for scene source files.
//!
//! Lexes the TSX subset the editor understands. Block and line comments are
//! skipped at the token level; their text survives in the source and is
//! recovered by span slicing where it matters (doc comments are kept as
//! tokens because type properties attach them).

use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token<'src> {
    // Keywords
    #[token("import")]
    Import,
    #[token("from")]
    From,
    #[token("export")]
    Export,
    #[token("default")]
    Default,
    #[token("function")]
    Function,
    #[token("return")]
    Return,
    #[token("const")]
    Const,
    #[token("type")]
    Type,
    #[token("interface")]
    Interface,
    #[token("as")]
    As,
    #[token("typeof")]
    Typeof,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Literals
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| lex.slice())]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, |lex| lex.slice())]
    Str(&'src str),

    /// JSDoc block, kept so the parser can attach it to type properties.
    #[regex(r"/\*\*([^*]|\*+[^*/])*\*+/", |lex| lex.slice(), priority = 4)]
    DocComment(&'src str),

    /// Plain comments carry no structure; this variant is never produced.
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/", logos::skip, priority = 3)]
    #[regex(r"//[^\n]*", logos::skip)]
    Comment,

    // Punctuation
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("/")]
    Slash,
    #[token("=>")]
    Arrow,
    #[token("=")]
    Eq,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token("|")]
    Pipe,
    #[token("&")]
    Amp,
    #[token("...")]
    Spread,
    #[token(".")]
    Dot,
    #[token("*")]
    Star,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("!")]
    Bang,

    /// Anything the lexer does not recognize. Harmless inside opaque spans
    /// (JSX text, expression containers); a parse error elsewhere.
    Unknown,
}

/// Tokenize source into (token, byte range) pairs.
pub fn tokenize(source: &str) -> Vec<(Token<'_>, Range<usize>)> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => tokens.push((Token::Unknown, span)),
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_import() {
        let tokens = tokenize(r#"import { Box } from "./box";"#);
        assert_eq!(tokens[0].0, Token::Import);
        assert_eq!(tokens[1].0, Token::LBrace);
        assert_eq!(tokens[2].0, Token::Ident("Box"));
        assert_eq!(tokens[3].0, Token::RBrace);
        assert_eq!(tokens[4].0, Token::From);
        assert_eq!(tokens[5].0, Token::Str("\"./box\""));
        assert_eq!(tokens[6].0, Token::Semi);
    }

    #[test]
    fn test_tokenize_jsx() {
        let tokens = tokenize("<mesh position={[1, 2, 3]} />");
        let kinds: Vec<_> = tokens.iter().map(|(t, _)| *t).collect();
        assert_eq!(kinds[0], Token::Lt);
        assert_eq!(kinds[1], Token::Ident("mesh"));
        assert_eq!(kinds[2], Token::Ident("position"));
        assert_eq!(kinds[3], Token::Eq);
        assert_eq!(kinds[4], Token::LBrace);
        assert!(kinds.contains(&Token::Slash));
    }

    #[test]
    fn test_doc_comment_kept_plain_comment_skipped() {
        let tokens = tokenize("/** hi */ /* bye */ const");
        assert!(matches!(tokens[0].0, Token::DocComment(_)));
        assert_eq!(tokens[1].0, Token::Const);
    }

    #[test]
    fn test_arrow_not_split() {
        let tokens = tokenize("() => x");
        assert_eq!(tokens[2].0, Token::Arrow);
    }

    #[test]
    fn test_keywords_vs_idents() {
        let tokens = tokenize("importer import");
        assert_eq!(tokens[0].0, Token::Ident("importer"));
        assert_eq!(tokens[1].0, Token::Import);
    }
}
