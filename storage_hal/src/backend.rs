//! Storage backend trait and contract types

use bitflags::bitflags;
use core_types::{FileName, Whence};
use thiserror::Error;

bitflags! {
    /// Access mode requested from a backend when opening a backing object.
    ///
    /// Distinct from the front end's permission masks: the core always asks
    /// the backend for full access and narrows rights itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessMode: u8 {
        /// Backing object will be read
        const READ = 0x01;
        /// Backing object will be written
        const WRITE = 0x02;
    }
}

/// Errors a storage backend may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BackendError {
    /// No backing object with that name exists
    #[error("no backing object with that name")]
    NotFound,
    /// The backing store has no room left
    #[error("backing store out of space")]
    NoSpace,
    /// The descriptor does not name an open backing object
    #[error("invalid backend descriptor")]
    BadDescriptor,
    /// The backing device failed
    #[error("backend I/O failure")]
    Io,
}

/// Byte-oriented storage backend contract.
///
/// Descriptors handed out by `open` must be small, dense, and reused after
/// `close` — the access-control core indexes its session table with them.
///
/// `format` is destructive: it discards every backing object and resets
/// descriptor assignment. The core invokes it once, during its own
/// initialization, so that no data from a previous run is ever observable.
pub trait StorageBackend {
    /// Opens (creating if absent) the backing object for `name`.
    ///
    /// `size_hint` suggests an initial size for newly created objects;
    /// backends are free to ignore it.
    fn open(
        &mut self,
        name: FileName,
        mode: AccessMode,
        size_hint: usize,
    ) -> Result<usize, BackendError>;

    /// Closes an open descriptor, allowing its reuse
    fn close(&mut self, fd: usize) -> Result<(), BackendError>;

    /// Reads from the current position; `Ok(0)` means end of file
    fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize, BackendError>;

    /// Writes at the current position, returning the bytes accepted
    fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize, BackendError>;

    /// Moves the file position; returns the new absolute offset
    fn seek(&mut self, fd: usize, offset: i64, whence: Whence) -> Result<u64, BackendError>;

    /// Removes the backing object for `name`
    fn remove(&mut self, name: FileName) -> Result<(), BackendError>;

    /// Destroys all backing data and resets descriptor assignment
    fn format(&mut self) -> Result<(), BackendError>;

    /// Liveness no-op
    fn ping(&mut self) {}

    /// Optional debug introspection hook
    fn dump(&self) {}
}
