//! Cell identity for the dependency graph.
//!
//! A `CellName` uniquely identifies a cell on the canvas. Names are
//! case-normalized identifiers, so `rate`, `Rate` and `RATE` are the same
//! cell. Used as graph nodes in the dependency graph.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::formula::functions;

/// Unique, case-normalized identifier for a cell.
///
/// Invariants (enforced by [`CellName::from_str`]):
/// - ASCII identifier shape: a letter or `_`, then letters, digits or `_`
/// - stored uppercase
/// - never one of the reserved constant names (`PI`, `E`, `TAU`, `INF`, `NAN`)
///
/// Serializes as a plain string; deserialization goes through [`FromStr`]
/// so the invariants cannot be bypassed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CellName(String);

impl CellName {
    /// Build a name from text already known to be normalized (parser output).
    pub(crate) fn from_normalized(name: String) -> Self {
        debug_assert!(name.chars().all(|c| !c.is_ascii_lowercase()));
        CellName(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CellName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, NameError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NameError::Empty);
        }
        let mut chars = s.chars();
        let first = chars.next().unwrap();
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(NameError::InvalidChar(first));
        }
        if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(NameError::InvalidChar(c));
        }
        let upper = s.to_ascii_uppercase();
        if functions::constant(&upper).is_some() {
            return Err(NameError::Reserved(upper));
        }
        Ok(CellName(upper))
    }
}

impl fmt::Display for CellName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CellName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellName({})", self.0)
    }
}

/// Why a piece of text cannot be used as a cell name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    Empty,
    InvalidChar(char),
    /// The name collides with a built-in constant.
    Reserved(String),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::Empty => write!(f, "cell name is empty"),
            NameError::InvalidChar(c) => write!(f, "invalid character {:?} in cell name", c),
            NameError::Reserved(name) => write!(f, "{} is a reserved constant name", name),
        }
    }
}

impl std::error::Error for NameError {}
