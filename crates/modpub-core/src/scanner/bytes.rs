//! Byte classification and cursor helpers for the declaration scanner.
//!
//! Every helper takes the whole buffer plus a position and returns a new
//! position. Positions never exceed `data.len()`, and none of the helpers
//! index past the end of the buffer, so truncated input is safe.

/// Line feed, terminates comments and version annotations
pub(crate) const NEWLINE: u8 = b'\n';
/// Carriage return
pub(crate) const RETURN: u8 = b'\r';
/// Horizontal tab
pub(crate) const TAB: u8 = b'\t';
/// Space, also the separator written before a new annotation
pub(crate) const SPACE: u8 = b' ';
/// Escape character recognized before a closing quote
pub(crate) const ESCAPE: u8 = b'\\';
/// Single quote
pub(crate) const SINGLE_QUOTE: u8 = b'\'';
/// Double quote
pub(crate) const DOUBLE_QUOTE: u8 = b'"';
/// Line comment opener
pub(crate) const COMMENT: &[u8] = b"//";

/// Returns the index of the first `needle` at or after `at`, or `data.len()`.
pub fn search(needle: u8, data: &[u8], at: usize) -> usize {
    let at = at.min(data.len());
    data[at..]
        .iter()
        .position(|&b| b == needle)
        .map_or(data.len(), |offset| at + offset)
}

/// ASCII whitespace as the module file understands it
pub fn is_space(b: u8) -> bool {
    matches!(b, RETURN | NEWLINE | TAB | SPACE)
}

/// Returns true if a single- or double-quote character
pub(crate) fn is_quote(b: u8) -> bool {
    b == SINGLE_QUOTE || b == DOUBLE_QUOTE
}

/// Returns true if a `//` comment starts at `at`.
pub fn is_comment(data: &[u8], at: usize) -> bool {
    data.get(at..).is_some_and(|rest| rest.starts_with(COMMENT))
}

/// Skips a `//` comment starting at `at`, returning the position of the
/// terminating newline (or the end of the buffer). Returns `at` unchanged
/// when no comment starts there.
pub fn skip_comment(data: &[u8], at: usize) -> usize {
    if is_comment(data, at) {
        search(NEWLINE, data, at + COMMENT.len())
    } else {
        at
    }
}

/// Returns the next significant position at or after `at`.
///
/// Whitespace is always skipped. Line comments are skipped only when
/// `skip_comments` is set.
pub fn next_significant(data: &[u8], at: usize, skip_comments: bool) -> usize {
    let mut at = at.min(data.len());
    while at < data.len() {
        if skip_comments && is_comment(data, at) {
            at = skip_comment(data, at);
        } else if is_space(data[at]) {
            at += 1;
        } else {
            break;
        }
    }
    at
}

/// Reports whether the quote at `quote_pos` is escaped.
///
/// Only the single preceding byte is inspected: `\"` counts as escaped,
/// and so does `\\"`. `quote_pos` must be past the opening quote.
pub fn is_escaped_quote(data: &[u8], quote_pos: usize) -> bool {
    quote_pos
        .checked_sub(1)
        .and_then(|prev| data.get(prev))
        .is_some_and(|&b| b == ESCAPE)
}

/// Lossy conversion of an identifier span to text
pub(crate) fn text(span: &[u8]) -> String {
    String::from_utf8_lossy(span).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search() {
        let data = b"module x\ngo 1.17";
        assert_eq!(search(NEWLINE, data, 0), 8);
        assert_eq!(search(NEWLINE, data, 9), data.len());
        assert_eq!(search(b'x', data, 100), data.len());
    }

    #[test]
    fn test_is_space() {
        for b in [b' ', b'\t', b'\r', b'\n'] {
            assert!(is_space(b));
        }
        assert!(!is_space(b'm'));
        assert!(!is_space(0x0B));
    }

    #[test]
    fn test_is_comment_at_buffer_end() {
        assert!(is_comment(b"a //", 2));
        assert!(!is_comment(b"a /", 2));
        assert!(!is_comment(b"a", 5));
    }

    #[test]
    fn test_skip_comment() {
        let data = b"// header\nmodule x";
        assert_eq!(skip_comment(data, 0), 9);
        assert_eq!(skip_comment(data, 10), 10);
        assert_eq!(skip_comment(b"// no newline", 0), 13);
    }

    #[test]
    fn test_next_significant() {
        let data = b"  // one\n\t// two\r\n  module x";
        assert_eq!(next_significant(data, 0, true), 20);
        assert_eq!(next_significant(data, 0, false), 2);
        assert_eq!(next_significant(b"   ", 0, true), 3);
        assert_eq!(next_significant(b"  /", 0, true), 2);
    }

    #[test]
    fn test_is_escaped_quote() {
        let data = br#""a\"b""#;
        assert!(is_escaped_quote(data, 3));
        assert!(!is_escaped_quote(data, 5));
        assert!(!is_escaped_quote(data, 0));
    }
}
