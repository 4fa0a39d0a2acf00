//! In-memory reference backend

use crate::backend::{AccessMode, BackendError, StorageBackend};
use core_types::{FileName, Whence};
use std::collections::BTreeMap;

/// An open position into one backing object
#[derive(Debug, Clone, Copy)]
struct Handle {
    name: FileName,
    pos: usize,
}

/// In-memory byte store.
///
/// The default backend for tests and demos: backing objects live in a map of
/// byte vectors, and descriptors are indices into a slot vector, reusing the
/// lowest free slot first so they stay dense.
///
/// Writes past the current end extend the object (zero-filling any gap left
/// by a seek); reads past the end return zero bytes.
#[derive(Debug, Default)]
pub struct RamStore {
    objects: BTreeMap<FileName, Vec<u8>>,
    handles: Vec<Option<Handle>>,
}

impl RamStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently open descriptors (for tests)
    pub fn open_count(&self) -> usize {
        self.handles.iter().filter(|h| h.is_some()).count()
    }

    /// Size in bytes of the backing object for `name`, if it exists
    pub fn object_len(&self, name: FileName) -> Option<usize> {
        self.objects.get(&name).map(Vec::len)
    }

    fn handle(&self, fd: usize) -> Result<Handle, BackendError> {
        self.handles
            .get(fd)
            .copied()
            .flatten()
            .ok_or(BackendError::BadDescriptor)
    }
}

impl StorageBackend for RamStore {
    fn open(
        &mut self,
        name: FileName,
        _mode: AccessMode,
        size_hint: usize,
    ) -> Result<usize, BackendError> {
        self.objects
            .entry(name)
            .or_insert_with(|| Vec::with_capacity(size_hint));

        let handle = Handle { name, pos: 0 };
        let fd = match self.handles.iter().position(|h| h.is_none()) {
            Some(free) => {
                self.handles[free] = Some(handle);
                free
            }
            None => {
                self.handles.push(Some(handle));
                self.handles.len() - 1
            }
        };
        log::debug!("ram: opened {} as backend fd {}", name, fd);
        Ok(fd)
    }

    fn close(&mut self, fd: usize) -> Result<(), BackendError> {
        self.handle(fd)?;
        self.handles[fd] = None;
        Ok(())
    }

    fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize, BackendError> {
        let handle = self.handle(fd)?;
        let data = self
            .objects
            .get(&handle.name)
            .ok_or(BackendError::NotFound)?;
        let available = data.len().saturating_sub(handle.pos);
        let n = available.min(buf.len());
        buf[..n].copy_from_slice(&data[handle.pos..handle.pos + n]);
        if let Some(h) = self.handles[fd].as_mut() {
            h.pos += n;
        }
        Ok(n)
    }

    fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize, BackendError> {
        let handle = self.handle(fd)?;
        let data = self
            .objects
            .get_mut(&handle.name)
            .ok_or(BackendError::NotFound)?;
        let end = handle.pos + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[handle.pos..end].copy_from_slice(buf);
        if let Some(h) = self.handles[fd].as_mut() {
            h.pos = end;
        }
        Ok(buf.len())
    }

    fn seek(&mut self, fd: usize, offset: i64, whence: Whence) -> Result<u64, BackendError> {
        let handle = self.handle(fd)?;
        let len = self
            .objects
            .get(&handle.name)
            .ok_or(BackendError::NotFound)?
            .len();
        let base = match whence {
            Whence::Set => 0i64,
            Whence::Cur => handle.pos as i64,
            Whence::End => len as i64,
        };
        let target = base + offset;
        if target < 0 {
            return Err(BackendError::Io);
        }
        if let Some(h) = self.handles[fd].as_mut() {
            h.pos = target as usize;
        }
        Ok(target as u64)
    }

    fn remove(&mut self, name: FileName) -> Result<(), BackendError> {
        self.objects
            .remove(&name)
            .map(|_| ())
            .ok_or(BackendError::NotFound)
    }

    fn format(&mut self) -> Result<(), BackendError> {
        self.objects.clear();
        self.handles.clear();
        Ok(())
    }

    fn dump(&self) {
        for (name, data) in &self.objects {
            log::debug!("ram: object {} holds {} bytes", name, data.len());
        }
    }
}
