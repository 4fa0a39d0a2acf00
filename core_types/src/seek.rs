//! Seek origins for file-position moves

use core::fmt;
use serde::{Deserialize, Serialize};

/// Determines how a seek offset is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Whence {
    /// Offset from the beginning of the file
    Set,
    /// Offset from the current file position
    Cur,
    /// Offset from the end of the file
    End,
}

impl fmt::Display for Whence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Whence::Set => write!(f, "set"),
            Whence::Cur => write!(f, "cur"),
            Whence::End => write!(f, "end"),
        }
    }
}
