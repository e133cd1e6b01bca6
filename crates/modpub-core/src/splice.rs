//! Rewrites the version annotation of a scanned buffer.
//!
//! The replacement is a plain byte splice: everything outside the
//! annotation range is copied through unchanged.

use crate::error::{Error, Result};
use crate::scanner::bytes::SPACE;
use crate::scanner::{Declaration, VERSION_PREFIX};
use tracing::trace;

/// Formats the annotation written for `version`, leading space included
pub fn annotation(version: &str) -> String {
    format!(
        "{}{}{}",
        char::from(SPACE),
        String::from_utf8_lossy(VERSION_PREFIX),
        version
    )
}

/// Returns a copy of `data` with `len` bytes at `offset` replaced by the
/// annotation for `version`.
///
/// A zero `len` inserts the annotation at `offset`. The input buffer is
/// not modified.
pub fn update(data: &[u8], offset: usize, len: usize, version: &str) -> Result<Vec<u8>> {
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| Error::splice_out_of_bounds(offset, len, data.len()))?;

    let annotation = annotation(version);
    let mut out = Vec::with_capacity(data.len() - len + annotation.len());
    out.extend_from_slice(&data[..offset]);
    out.extend_from_slice(annotation.as_bytes());
    out.extend_from_slice(&data[end..]);

    trace!(
        "Spliced {} bytes at offset {} into {} bytes",
        len,
        offset,
        annotation.len()
    );
    Ok(out)
}

/// Rewrites the annotation located by `declaration` in the same buffer.
pub fn update_declaration(data: &[u8], declaration: &Declaration, version: &str) -> Result<Vec<u8>> {
    update(
        data,
        declaration.version_offset(),
        declaration.version_len(),
        version,
    )
}
