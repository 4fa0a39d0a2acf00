//! Discard-everything measurement backend

use crate::backend::{AccessMode, BackendError, StorageBackend};
use core_types::{FileName, Whence};

/// A backend that accepts every operation and stores nothing.
///
/// Reads always report end of file; writes acknowledge the full buffer and
/// discard it. Useful for measuring front-end overhead in isolation from any
/// real storage cost. Descriptors are handed out by a plain counter, reset
/// by `format`, so long-running sessions against this backend should reopen
/// sparingly.
#[derive(Debug, Default)]
pub struct NullStore {
    next_fd: usize,
}

impl NullStore {
    /// Creates a fresh store
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for NullStore {
    fn open(
        &mut self,
        _name: FileName,
        _mode: AccessMode,
        _size_hint: usize,
    ) -> Result<usize, BackendError> {
        let fd = self.next_fd;
        self.next_fd += 1;
        Ok(fd)
    }

    fn close(&mut self, _fd: usize) -> Result<(), BackendError> {
        Ok(())
    }

    fn read(&mut self, _fd: usize, _buf: &mut [u8]) -> Result<usize, BackendError> {
        Ok(0)
    }

    fn write(&mut self, _fd: usize, buf: &[u8]) -> Result<usize, BackendError> {
        Ok(buf.len())
    }

    fn seek(&mut self, _fd: usize, _offset: i64, _whence: Whence) -> Result<u64, BackendError> {
        Ok(0)
    }

    fn remove(&mut self, _name: FileName) -> Result<(), BackendError> {
        Ok(())
    }

    fn format(&mut self) -> Result<(), BackendError> {
        self.next_fd = 0;
        Ok(())
    }
}
