//! Error types for the modpub-core library.
//!
//! The scanner itself never fails; these errors come from the strict
//! entry points (`parse_module`, `update`) and from version decision.

use thiserror::Error;

/// Result type alias for modpub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all modpub-core operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// No `module` declaration (or an empty identifier) in the buffer
    #[error("no module declaration found")]
    ModuleNotFound,

    /// Version string does not have the `N.N.N` shape
    #[error("invalid version '{version}': {details}")]
    InvalidVersion {
        /// The rejected version text
        version: String,
        /// Why it was rejected
        details: String,
    },

    /// Requested version has a different number of components
    #[error("version '{requested}' does not have the same number of components as '{current}'")]
    ComponentCountMismatch {
        /// Version currently in the file
        current: String,
        /// Version asked for
        requested: String,
    },

    /// Requested version is not greater than the current one
    #[error("version '{requested}' is not greater than current version '{current}'")]
    NotIncreasing {
        /// Version currently in the file
        current: String,
        /// Version asked for
        requested: String,
    },

    /// Splice range does not lie within the buffer
    #[error("splice range {offset}+{len} is outside a buffer of {buffer_len} bytes")]
    SpliceOutOfBounds {
        /// Start of the range
        offset: usize,
        /// Length of the range
        len: usize,
        /// Length of the buffer
        buffer_len: usize,
    },
}

impl Error {
    /// Creates a new invalid version error
    pub fn invalid_version(version: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
            details: details.into(),
        }
    }

    /// Creates a new component count mismatch error
    pub fn component_count_mismatch(current: impl Into<String>, requested: impl Into<String>) -> Self {
        Self::ComponentCountMismatch {
            current: current.into(),
            requested: requested.into(),
        }
    }

    /// Creates a new not-increasing error
    pub fn not_increasing(current: impl Into<String>, requested: impl Into<String>) -> Self {
        Self::NotIncreasing {
            current: current.into(),
            requested: requested.into(),
        }
    }

    /// Creates a new splice bounds error
    pub fn splice_out_of_bounds(offset: usize, len: usize, buffer_len: usize) -> Self {
        Self::SpliceOutOfBounds {
            offset,
            len,
            buffer_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_version("v.1.1", "must start with a digit");
        assert!(err.to_string().contains("v.1.1"));
        assert!(err.to_string().contains("must start with a digit"));

        let err = Error::splice_out_of_bounds(10, 4, 12);
        assert_eq!(
            err.to_string(),
            "splice range 10+4 is outside a buffer of 12 bytes"
        );
    }
}
