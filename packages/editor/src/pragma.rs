//! Soft-delete pragma codec.
//!
//! Deleting an element never removes its text; the text is wrapped in a
//! comment container so the element disappears from the parsed tree while
//! staying in the file. This wire format is shared with other tooling and
//! must stay bit-compatible, including the escaping rule below.
//!
//! Because the wrapped text may itself contain a pragma (deleting an
//! element with a deleted child), the body is escaped before wrapping:
//! `\` becomes `\\`, then `*/` becomes `*\/`. Unescaping scans left to
//! right and reverses both, which round-trips any nesting depth exactly.

pub const OPEN: &str = "{/*<deleted>";
pub const CLOSE: &str = "</deleted>*/}";

/// Wrap element text in a delete pragma.
pub fn wrap(text: &str) -> String {
    format!("{}{}{}", OPEN, escape(text), CLOSE)
}

/// Strip the pragma wrapper and restore the original text. `None` when
/// `pragma` is not a well-formed delete pragma.
pub fn unwrap(pragma: &str) -> Option<String> {
    let body = pragma.strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
    Some(unescape(body))
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace("*/", "*\\/")
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                Some('/') => {
                    chars.next();
                    out.push('/');
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_round_trips() {
        let text = "<mesh position={[1, 2, 3]} />";
        assert_eq!(unwrap(&wrap(text)).as_deref(), Some(text));
    }

    #[test]
    fn test_nested_pragma_round_trips() {
        let inner = wrap("<mesh />");
        let outer = format!("<group>\n  {}\n</group>", inner);
        let wrapped = wrap(&outer);
        // the inner `*/` must not terminate the outer comment early
        assert_eq!(wrapped.matches("*/").count(), 1);
        assert_eq!(unwrap(&wrapped).as_deref(), Some(outer.as_str()));
    }

    #[test]
    fn test_doubly_nested_round_trips() {
        let level1 = wrap("<mesh />");
        let level2 = wrap(&level1);
        let level3 = wrap(&level2);
        assert_eq!(unwrap(&level3).as_deref(), Some(level2.as_str()));
        assert_eq!(unwrap(&level2).as_deref(), Some(level1.as_str()));
        assert_eq!(unwrap(&level1).as_deref(), Some("<mesh />"));
    }

    #[test]
    fn test_backslashes_survive() {
        let text = "<mesh label=\"a\\b*/c\" />";
        assert_eq!(unwrap(&wrap(text)).as_deref(), Some(text));
    }

    #[test]
    fn test_unwrap_rejects_non_pragma() {
        assert_eq!(unwrap("<mesh />"), None);
        assert_eq!(unwrap("{/* plain comment */}"), None);
    }
}
