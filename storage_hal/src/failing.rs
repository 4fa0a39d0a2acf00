//! Fault-injection wrapper backend

use crate::backend::{AccessMode, BackendError, StorageBackend};
use core_types::{FileName, Whence};

/// Policy for when injected failures should occur
#[derive(Debug, Clone)]
pub enum FailurePolicy {
    /// Never fail (passthrough)
    Never,
    /// Fail every write once `n` writes have succeeded
    AfterWrites(usize),
    /// Fail `open` and `remove` for specific names
    OnNames(Vec<FileName>),
}

/// Wrapper around a backend that injects failures for testing.
///
/// Lets tests exercise the core's backend-failure paths (failed creation
/// rollback, write errors surfacing through single-byte I/O) without a
/// device that actually breaks.
pub struct FailingStore<B: StorageBackend> {
    inner: B,
    policy: FailurePolicy,
    write_count: usize,
}

impl<B: StorageBackend> FailingStore<B> {
    /// Wraps `inner` with the given failure policy
    pub fn new(inner: B, policy: FailurePolicy) -> Self {
        Self {
            inner,
            policy,
            write_count: 0,
        }
    }

    /// Access to the wrapped backend (for inspection)
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Mutable access to the wrapped backend
    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    /// Number of writes that have been let through
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    /// Replaces the failure policy and resets the write counter
    pub fn set_policy(&mut self, policy: FailurePolicy) {
        self.policy = policy;
        self.write_count = 0;
    }

    fn fails_name(&self, name: FileName) -> bool {
        matches!(&self.policy, FailurePolicy::OnNames(names) if names.contains(&name))
    }
}

impl<B: StorageBackend> StorageBackend for FailingStore<B> {
    fn open(
        &mut self,
        name: FileName,
        mode: AccessMode,
        size_hint: usize,
    ) -> Result<usize, BackendError> {
        if self.fails_name(name) {
            return Err(BackendError::Io);
        }
        self.inner.open(name, mode, size_hint)
    }

    fn close(&mut self, fd: usize) -> Result<(), BackendError> {
        self.inner.close(fd)
    }

    fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize, BackendError> {
        self.inner.read(fd, buf)
    }

    fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize, BackendError> {
        if matches!(self.policy, FailurePolicy::AfterWrites(n) if self.write_count >= n) {
            return Err(BackendError::Io);
        }
        self.write_count += 1;
        self.inner.write(fd, buf)
    }

    fn seek(&mut self, fd: usize, offset: i64, whence: Whence) -> Result<u64, BackendError> {
        self.inner.seek(fd, offset, whence)
    }

    fn remove(&mut self, name: FileName) -> Result<(), BackendError> {
        if self.fails_name(name) {
            return Err(BackendError::Io);
        }
        self.inner.remove(name)
    }

    fn format(&mut self) -> Result<(), BackendError> {
        self.inner.format()
    }

    fn ping(&mut self) {
        self.inner.ping()
    }

    fn dump(&self) {
        self.inner.dump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::RamStore;

    fn rw() -> AccessMode {
        AccessMode::READ | AccessMode::WRITE
    }

    #[test]
    fn test_failing_store_never() {
        let mut store = FailingStore::new(RamStore::new(), FailurePolicy::Never);
        let fd = store.open(FileName::new('a'), rw(), 0).unwrap();
        assert!(store.write(fd, b"ok").is_ok());
    }

    #[test]
    fn test_failing_store_after_writes() {
        let mut store = FailingStore::new(RamStore::new(), FailurePolicy::AfterWrites(2));
        let fd = store.open(FileName::new('a'), rw(), 0).unwrap();
        assert!(store.write(fd, b"1").is_ok());
        assert!(store.write(fd, b"2").is_ok());
        assert_eq!(store.write(fd, b"3"), Err(BackendError::Io));
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_failing_store_on_names() {
        let bad = FileName::new('x');
        let mut store = FailingStore::new(RamStore::new(), FailurePolicy::OnNames(vec![bad]));
        assert_eq!(store.open(bad, rw(), 0), Err(BackendError::Io));
        assert!(store.open(FileName::new('a'), rw(), 0).is_ok());
        assert_eq!(store.remove(bad), Err(BackendError::Io));
    }

    #[test]
    fn test_set_policy_resets_counter() {
        let mut store = FailingStore::new(RamStore::new(), FailurePolicy::AfterWrites(0));
        let fd = store.open(FileName::new('a'), rw(), 0).unwrap();
        assert!(store.write(fd, b"1").is_err());

        store.set_policy(FailurePolicy::Never);
        assert!(store.write(fd, b"1").is_ok());
    }
}
