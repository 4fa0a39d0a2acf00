//! Logical file names

use core::fmt;
use serde::{Deserialize, Serialize};

/// Logical file name in the flat namespace.
///
/// Names are single identifiers drawn from a small fixed alphabet. A name
/// this small fits in one CPU register, so it can cross the enclave boundary
/// by value: a caller can never smuggle a pointer into protected memory
/// disguised as a name. Uniqueness among live files is what matters; the
/// alphabet itself is a target-size choice, not a semantic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileName(char);

impl FileName {
    /// Creates a file name from a single identifier character
    pub const fn new(c: char) -> Self {
        Self(c)
    }

    /// Returns the underlying identifier character
    pub const fn as_char(&self) -> char {
        self.0
    }
}

impl From<char> for FileName {
    fn from(c: char) -> Self {
        Self(c)
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.0)
    }
}
