//! Error taxonomy for the access-control core

use core::fmt;
use storage_hal::BackendError;
use thiserror::Error;

/// Which fixed-capacity pool ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    /// The file-record arena
    Files,
    /// The permission-record arena
    Permissions,
    /// The open-descriptor table
    Descriptors,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pool::Files => write!(f, "file"),
            Pool::Permissions => write!(f, "permission"),
            Pool::Descriptors => write!(f, "descriptor"),
        }
    }
}

/// Errors reported by the access-control core.
///
/// Every failure is deterministic given the current state; retrying without
/// a state change returns the same answer, so retry policy belongs to the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FsError {
    /// No live file carries the given name
    #[error("no file with that name")]
    NotFound,
    /// The caller's ACL entry is missing or insufficient, or the mutation
    /// would touch a creator entry
    #[error("permission denied")]
    PermissionDenied,
    /// A fixed-capacity pool has no free slot left
    #[error("{0} pool exhausted")]
    ResourceExhausted(Pool),
    /// The descriptor is out of range, unbound, or owned by another module
    #[error("invalid file descriptor")]
    InvalidDescriptor,
    /// The file still has open sessions
    #[error("file is busy")]
    Busy,
    /// The storage backend failed or broke its descriptor contract
    #[error("storage backend failure: {0}")]
    Backend(#[from] BackendError),
}
