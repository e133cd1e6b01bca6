//! Module declaration scanner.
//!
//! Finds the `module <identifier> //v<version>` line in a `go.mod` buffer
//! without tokenizing the rest of the file.
//!
//! ## Algorithm Overview
//!
//! 1. Skip whitespace and `//` line comments
//! 2. Test for the `module ` keyword; on a miss advance one byte and go to 1
//! 3. Read the identifier, either quoted or up to whitespace/comment
//! 4. Read an optional `//v` annotation directly after the identifier
//!
//! The keyword search is a scan, not an anchored match, so stray bytes
//! before the declaration are tolerated. Everything the scanner does not
//! recognize is left for the caller to pass through untouched.
//!
//! ## Example
//!
//! ```
//! use modpub_core::scanner::scan;
//!
//! let data = b"// my module\nmodule example.com/pkg //v0.1.0\n\ngo 1.21\n";
//! let declaration = scan(data, 0);
//!
//! assert_eq!(declaration.name, "example.com/pkg");
//! assert_eq!(declaration.version, "0.1.0");
//! assert_eq!(&data[declaration.range.clone()], b" //v0.1.0");
//! ```

pub(crate) mod bytes;

use crate::error::{Error, Result};
use crate::version;
use std::ops::Range;
use tracing::{debug, trace};

pub use bytes::{
    is_comment, is_escaped_quote, is_space, next_significant, search, skip_comment,
};

/// Keyword that introduces the declaration, including its separator
pub const KEYWORD: &[u8] = b"module ";

/// Prefix marking a version annotation comment
pub const VERSION_PREFIX: &[u8] = b"//v";

/// The module declaration found by [`scan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Module identifier, without quotes when it was quoted
    pub name: String,
    /// Version from the annotation, empty when absent or malformed
    pub version: String,
    /// Bytes in the original buffer occupied by the annotation.
    ///
    /// Empty when there is no valid annotation; it then marks the
    /// insertion point right after the identifier.
    pub range: Range<usize>,
}

impl Declaration {
    fn not_found(position: usize) -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            range: position..position,
        }
    }

    /// Returns true if a module identifier was found
    pub fn is_found(&self) -> bool {
        !self.name.is_empty()
    }

    /// Returns true if a valid version annotation was found
    pub fn has_version(&self) -> bool {
        !self.version.is_empty()
    }

    /// Start of the annotation range
    pub fn version_offset(&self) -> usize {
        self.range.start
    }

    /// Length of the annotation range, 0 when there is none
    pub fn version_len(&self) -> usize {
        self.range.len()
    }
}

/// Scans `data` from `start` for the module declaration.
///
/// Never fails: a missing keyword yields an empty declaration positioned
/// where the scan stopped, and a missing or malformed annotation yields
/// an empty version.
pub fn scan(data: &[u8], start: usize) -> Declaration {
    let mut position = start.min(data.len());

    trace!("Scanning {} bytes from offset {}", data.len(), position);

    while position < data.len() {
        position = next_significant(data, position, true);

        let rest = &data[position..];
        if rest.len() < KEYWORD.len() {
            position = data.len();
            break;
        }

        if rest.starts_with(KEYWORD) {
            trace!("Found keyword at offset {}", position);
            let (name, name_end) = parse_name(data, position + KEYWORD.len());
            let (version, range) = parse_version(data, name_end);

            debug!(
                "Parsed module '{}' version '{}' (annotation {}..{})",
                name, version, range.start, range.end
            );
            return Declaration {
                name,
                version,
                range,
            };
        }

        position += 1;
    }

    debug!("No module keyword found in {} bytes", data.len());
    Declaration::not_found(position)
}

/// Scans the whole buffer and requires a module identifier.
pub fn parse_module(data: &[u8]) -> Result<Declaration> {
    let declaration = scan(data, 0);
    if declaration.is_found() {
        Ok(declaration)
    } else {
        Err(Error::ModuleNotFound)
    }
}

/// Parses the identifier starting at or after `at`.
///
/// Returns the identifier and the position just past it.
fn parse_name(data: &[u8], at: usize) -> (String, usize) {
    let start = next_significant(data, at, false);
    let Some(&first) = data.get(start) else {
        return (String::new(), start);
    };

    let mut end = start;
    if bytes::is_quote(first) {
        end = search(first, data, start + 1);
        if closes_quote(data, end) {
            let name = bytes::text(&data[start + 1..end]);
            return (name, (end + 1).min(data.len()));
        }
        // Escaped quote: read the raw token from here, quotes included.
        trace!("Escaped quote at offset {}, reading raw identifier", end);
    }

    while end < data.len() && !is_space(data[end]) && !is_comment(data, end) {
        end += 1;
    }

    (bytes::text(&data[start..end]), end)
}

/// Decides whether the quote found at `end` terminates a quoted identifier.
///
/// Only a single preceding `\` is considered; there is no escape-sequence
/// parsing and no re-scan for a later closing quote.
fn closes_quote(data: &[u8], end: usize) -> bool {
    !is_escaped_quote(data, end)
}

/// Parses an optional `//v` annotation after the identifier ending at `at`.
fn parse_version(data: &[u8], at: usize) -> (String, Range<usize>) {
    let position = next_significant(data, at, false);

    if data[position..].starts_with(VERSION_PREFIX) {
        let value_start = position + VERSION_PREFIX.len();
        let mut end = search(bytes::NEWLINE, data, value_start);
        // CRLF line: the carriage return stays outside the annotation.
        if end > value_start && data[end - 1] == bytes::RETURN {
            end -= 1;
        }
        let candidate = &data[value_start..end];

        if version::is_valid(candidate) {
            return (bytes::text(candidate), at..end);
        }
        trace!(
            "Ignoring malformed version annotation at offset {}",
            position
        );
    }

    (String::new(), at..at)
}
