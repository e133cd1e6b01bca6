//! Version syntax, bumping and acceptance rules.
//!
//! A version is a dot-separated run of non-empty decimal components such
//! as `0.1.0`. It is at least five characters long and starts and ends with
//! a digit. Nothing else is accepted: no `v` prefix, no pre-release
//! suffix.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Version used when the module file carries no annotation yet
pub const DEFAULT_VERSION: &str = "0.0.0";

/// Shortest accepted version text (`0.0.0`)
const MIN_VERSION_LEN: usize = 5;

const SEPARATOR: char = '.';

/// How empty or unreadable components are treated.
///
/// `Strict` requires every component to be a non-empty digit run that
/// fits in `u64`. `Lenient` admits empty components (`1..00`) and reads
/// empty or oversized components as 0, which lets two malformed
/// components compare equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumericPolicy {
    /// Empty or unreadable components make the version invalid
    #[default]
    Strict,
    /// Empty components pass syntax and unreadable ones read as 0
    Lenient,
}

/// Configuration for [`decide_with`]
#[derive(Debug, Clone, Default)]
pub struct DecideConfig {
    /// Component conversion policy
    pub policy: NumericPolicy,
}

impl DecideConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the component conversion policy
    pub fn policy(mut self, policy: NumericPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Returns the reason `b` is not valid version syntax, if any.
fn syntax_issue(b: &[u8], policy: NumericPolicy) -> Option<String> {
    if b.len() < MIN_VERSION_LEN {
        return Some(format!("must be at least {MIN_VERSION_LEN} characters"));
    }
    if !b[0].is_ascii_digit() {
        return Some("must start with a digit".to_string());
    }
    if !b[b.len() - 1].is_ascii_digit() {
        return Some("must end with a digit".to_string());
    }
    if let Some(i) = b
        .iter()
        .position(|&c| !c.is_ascii_digit() && c != SEPARATOR as u8)
    {
        return Some(format!(
            "unexpected byte {:?} at position {}",
            char::from(b[i]),
            i
        ));
    }
    if policy == NumericPolicy::Strict && b.windows(2).any(|w| w == [SEPARATOR as u8; 2]) {
        return Some("components must not be empty".to_string());
    }
    None
}

/// Checks that `b` has valid version syntax, e.g. `0.0.0`.
///
/// Every component must be a non-empty digit run. Used by the scanner to
/// recognize annotations.
pub fn is_valid(b: &[u8]) -> bool {
    is_valid_with(b, NumericPolicy::Strict)
}

/// Checks version syntax under `policy`
pub fn is_valid_with(b: &[u8], policy: NumericPolicy) -> bool {
    syntax_issue(b, policy).is_none()
}

/// A syntactically valid version string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(String);

impl Version {
    /// Parses and validates version text with strict syntax
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, NumericPolicy::Strict)
    }

    /// Parses and validates version text under `policy`
    pub fn parse_with(text: &str, policy: NumericPolicy) -> Result<Self> {
        match syntax_issue(text.as_bytes(), policy) {
            None => Ok(Self(text.to_string())),
            Some(details) => Err(Error::invalid_version(text, details)),
        }
    }

    /// The version every module starts from
    pub fn baseline() -> Self {
        Self(DEFAULT_VERSION.to_string())
    }

    /// The version text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the version into integer components
    pub fn components(&self, policy: NumericPolicy) -> Result<Vec<u64>> {
        self.0
            .split(SEPARATOR)
            .map(|part| self.read_component(part, policy))
            .collect()
    }

    /// Returns the version with its last component incremented.
    ///
    /// Other components are kept exactly as written.
    pub fn next(&self, policy: NumericPolicy) -> Result<Self> {
        let (head, last) = match self.0.rsplit_once(SEPARATOR) {
            Some((head, last)) => (Some(head), last),
            None => (None, self.0.as_str()),
        };
        let bumped = self
            .read_component(last, policy)?
            .checked_add(1)
            .ok_or_else(|| Error::invalid_version(&self.0, "last component overflows"))?;

        Ok(match head {
            Some(head) => Self(format!("{head}{SEPARATOR}{bumped}")),
            None => Self(bumped.to_string()),
        })
    }

    fn read_component(&self, part: &str, policy: NumericPolicy) -> Result<u64> {
        match (part.parse::<u64>(), policy) {
            (Ok(n), _) => Ok(n),
            (Err(_), NumericPolicy::Lenient) => Ok(0),
            (Err(e), NumericPolicy::Strict) => Err(Error::invalid_version(
                &self.0,
                format!("component '{part}' is not a number: {e}"),
            )),
        }
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Decides the version to publish, using the default configuration.
///
/// See [`decide_with`].
pub fn decide(current: &str, requested: &str) -> Result<Version> {
    decide_with(current, requested, &DecideConfig::default())
}

/// Decides the version to publish.
///
/// With an empty `requested`, the next patch of `current` is returned
/// (or [`DEFAULT_VERSION`] when `current` is empty too). Otherwise
/// `requested` must be valid syntax and, unless `current` is empty or
/// identical, have as many components as `current` and be strictly
/// greater when compared component by component.
pub fn decide_with(current: &str, requested: &str, config: &DecideConfig) -> Result<Version> {
    if requested.is_empty() {
        if current.is_empty() {
            return Ok(Version::baseline());
        }
        let next = Version::parse_with(current, config.policy)?.next(config.policy)?;
        debug!("Next version after {} is {}", current, next);
        return Ok(next);
    }

    let requested_version = Version::parse_with(requested, config.policy)?;
    if current.is_empty() || current == requested {
        return Ok(requested_version);
    }

    let current_version = Version::parse_with(current, config.policy)?;
    let current_parts = current_version.components(config.policy)?;
    let requested_parts = requested_version.components(config.policy)?;

    if current_parts.len() != requested_parts.len() {
        return Err(Error::component_count_mismatch(current, requested));
    }

    for (c, r) in current_parts.iter().zip(&requested_parts) {
        match r.cmp(c) {
            Ordering::Greater => return Ok(requested_version),
            Ordering::Less => break,
            Ordering::Equal => {}
        }
    }

    Err(Error::not_increasing(current, requested))
}
