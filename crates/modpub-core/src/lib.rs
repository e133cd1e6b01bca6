//! # modpub-core
//!
//! A library for reading and rewriting the version annotation of a Go
//! module file.
//!
//! The module line carries its release version in a trailing comment:
//!
//! ```text
//! module github.com/acme/widget //v0.4.2
//! ```
//!
//! This crate provides the core functionality for:
//! - Scanning a `go.mod` buffer for the module identifier and version
//! - Deciding the next version, or validating one supplied by the user
//! - Splicing the new annotation into the buffer without touching
//!   anything else
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`scanner`]: Declaration scanning over raw bytes
//! - [`version`]: Version syntax and acceptance rules
//! - [`splice`]: Byte-range rewriting of the annotation
//! - [`error`]: Error types and handling
//!
//! None of them perform I/O; reading and writing the file is left to the
//! caller.
//!
//! ## Example
//!
//! ```
//! use modpub_core::{decide, parse_module, update_declaration};
//!
//! let data = b"module example.com/pkg //v0.1.0\n\ngo 1.21\n";
//!
//! let declaration = parse_module(data)?;
//! let next = decide(&declaration.version, "")?;
//! let updated = update_declaration(data, &declaration, next.as_str())?;
//!
//! assert_eq!(updated, b"module example.com/pkg //v0.1.1\n\ngo 1.21\n".to_vec());
//! # Ok::<(), modpub_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod scanner;
pub mod splice;
pub mod version;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use scanner::{parse_module, scan, Declaration};
pub use splice::{update, update_declaration};
pub use version::{decide, decide_with, DecideConfig, NumericPolicy, Version, DEFAULT_VERSION};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
