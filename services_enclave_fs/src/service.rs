//! The access-control front end
//!
//! Every operation follows the same shape: fetch the caller's identity from
//! the oracle (once, at entry), lazily initialize on first use, check the
//! request against the catalog, and only then touch the backend. Components
//! below the catalog never call upward, and the backend is only ever invoked
//! from this layer.

use crate::catalog::{Catalog, FileSlot, PermSlot};
use crate::descriptor::{DescriptorTable, Fd};
use crate::error::{FsError, Pool};
use crate::snapshot::{self, FsSnapshot};
use core_types::{FileName, Perm, Whence};
use identity::{IdentityOracle, ModuleId};
use storage_hal::{AccessMode, BackendError, StorageBackend};

/// Capacities of the fixed record pools.
///
/// Chosen once at construction; the service never grows past them. The
/// defaults match a small embedded deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsLimits {
    /// Maximum number of live files
    pub max_files: usize,
    /// Maximum number of ACL entries across all files
    pub max_perms: usize,
    /// Maximum number of simultaneously open sessions
    pub max_open: usize,
}

impl Default for FsLimits {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_perms: 10,
            max_open: 8,
        }
    }
}

/// Size argument to [`EnclaveFs::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenSize {
    /// Open only if the file already exists; never create
    ExistingOnly,
    /// Create the file if absent, hinting an initial size in bytes.
    ///
    /// On an existing file the hint is accepted and forwarded but carries
    /// no obligation for the backend.
    Bytes(usize),
}

/// The secure file-naming and access-control service.
///
/// One instance exists per process, owning the record pools, the directory,
/// the descriptor table, the identity oracle, and the storage backend. All
/// methods take `&mut self`: invocations are strictly serialized by the
/// surrounding isolation runtime, so the core needs no locking of its own.
pub struct EnclaveFs<B, O> {
    backend: B,
    oracle: O,
    catalog: Catalog,
    fds: DescriptorTable,
    initialized: bool,
}

impl<B: StorageBackend, O: IdentityOracle> EnclaveFs<B, O> {
    /// Creates a service with default pool limits
    pub fn new(backend: B, oracle: O) -> Self {
        Self::with_limits(backend, oracle, FsLimits::default())
    }

    /// Creates a service with explicit pool limits
    pub fn with_limits(backend: B, oracle: O, limits: FsLimits) -> Self {
        Self {
            backend,
            oracle,
            catalog: Catalog::new(limits.max_files, limits.max_perms),
            fds: DescriptorTable::new(limits.max_open),
            initialized: false,
        }
    }

    /// Access to the backend (for inspection in tests)
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Initializes the service if it has not run yet.
    ///
    /// The first call resets all metadata and formats the backend, wiping
    /// any data a previous run may have left behind. Later calls are no-ops;
    /// initialization also happens implicitly before the first
    /// state-touching operation.
    pub fn init(&mut self) -> Result<(), FsError> {
        self.ensure_init()
    }

    /// Liveness probe; forwards to the backend without touching state
    pub fn ping(&mut self) {
        log::debug!("ping from {}", self.oracle.caller_identity());
        self.backend.ping();
    }

    /// Opens a file, creating it when absent.
    ///
    /// Creating makes the caller the file's creator, with the full
    /// non-transferable creator permissions. Opening an existing file checks
    /// the requested `flags` against the caller's ACL entry. Either way the
    /// backend is asked for full read/write access — the finer-grained
    /// rights are enforced here on every byte operation.
    pub fn open(&mut self, name: FileName, flags: Perm, size: OpenSize) -> Result<Fd, FsError> {
        let caller = self.oracle.caller_identity();
        self.ensure_init()?;

        if self.catalog.lookup(name).is_some() {
            log::debug!("{}: open existing for {}", name, caller);
            let entry = self.catalog.resolve_permission(name, caller, flags)?;
            let hint = match size {
                OpenSize::Bytes(n) => n,
                OpenSize::ExistingOnly => 0,
            };
            return self.bind_backend(name, hint, entry);
        }

        let hint = match size {
            OpenSize::ExistingOnly => {
                log::warn!("{}: absent, and caller declined creation", name);
                return Err(FsError::NotFound);
            }
            OpenSize::Bytes(n) => n,
        };
        log::debug!("{}: creating for {}", name, caller);
        let (file, entry) = self.catalog.create_file(name, caller)?;
        match self.bind_backend(name, hint, entry) {
            Ok(fd) => Ok(fd),
            Err(err) => {
                // a failed open must not leave a half-created file behind;
                // the new file sits at the directory head
                self.catalog.remove_file(file, None);
                Err(err)
            }
        }
    }

    /// Closes one of the caller's open sessions
    pub fn close(&mut self, fd: Fd) -> Result<(), FsError> {
        let caller = self.oracle.caller_identity();
        self.ensure_init()?;
        self.owned_binding(fd, caller)?;
        self.release(fd.index())
    }

    /// Reads a single byte from an open session; `Ok(None)` at end of file.
    ///
    /// Requires read permission on the entry the session was opened under.
    /// The byte travels by value, so no unprotected buffer is involved.
    pub fn getc(&mut self, fd: Fd) -> Result<Option<u8>, FsError> {
        let caller = self.oracle.caller_identity();
        self.ensure_init()?;
        let entry = self.owned_binding(fd, caller)?;
        self.require_flags(entry, Perm::READ)?;

        let mut buf = [0u8; 1];
        let n = self.backend.read(fd.index(), &mut buf)?;
        Ok((n > 0).then_some(buf[0]))
    }

    /// Writes a single byte to an open session.
    ///
    /// Requires write permission on the entry the session was opened under.
    pub fn putc(&mut self, fd: Fd, byte: u8) -> Result<(), FsError> {
        let caller = self.oracle.caller_identity();
        self.ensure_init()?;
        let entry = self.owned_binding(fd, caller)?;
        self.require_flags(entry, Perm::WRITE)?;

        let n = self.backend.write(fd.index(), &[byte])?;
        if n == 0 {
            return Err(FsError::Backend(BackendError::Io));
        }
        Ok(())
    }

    /// Moves the file position of an open session.
    ///
    /// Only session ownership is checked — opening already proved the
    /// caller's right to the session.
    pub fn seek(&mut self, fd: Fd, offset: i64, whence: Whence) -> Result<u64, FsError> {
        let caller = self.oracle.caller_identity();
        self.ensure_init()?;
        self.owned_binding(fd, caller)?;
        Ok(self.backend.seek(fd.index(), offset, whence)?)
    }

    /// Removes a file and its entire ACL.
    ///
    /// Requires root authority on the file. Fails with `Busy` while any
    /// session remains open — other modules' sessions are never silently
    /// disconnected by a removal.
    pub fn remove(&mut self, name: FileName) -> Result<(), FsError> {
        let caller = self.oracle.caller_identity();
        self.ensure_init()?;

        let (_, file, prev) = self
            .catalog
            .resolve_with_predecessor(name, caller, Perm::ROOT)?;
        let open_count = self.catalog.file(file).open_count;
        if open_count > 0 {
            log::warn!("{}: {} sessions still open", name, open_count);
            return Err(FsError::Busy);
        }
        self.catalog.remove_file(file, prev);
        self.backend.remove(name)?;
        Ok(())
    }

    /// Changes `subject`'s permissions on a file.
    ///
    /// Requires root authority on the file. `Perm::NIL` revokes the
    /// subject's entry (force-closing any sessions it still has open);
    /// anything else adds or overwrites the entry. The creator entry can
    /// be neither revoked nor overridden, and the creator mask can never
    /// be granted.
    pub fn chmod(&mut self, name: FileName, subject: ModuleId, flags: Perm) -> Result<(), FsError> {
        let caller = self.oracle.caller_identity();
        self.ensure_init()?;

        let entry = self.catalog.resolve_permission(name, caller, Perm::ROOT)?;
        let file = self.catalog.perm(entry).file;
        let result = if flags == Perm::NIL {
            self.revoke(file, subject)
        } else {
            self.catalog.grant(file, subject, flags)
        };
        debug_assert!(self.catalog.creator_invariant_holds());
        result
    }

    /// Confirms that a file exists and was created by `claimed_owner`.
    ///
    /// Pure provenance check: succeeds or fails without granting anything.
    pub fn attest(&mut self, name: FileName, claimed_owner: ModuleId) -> Result<(), FsError> {
        self.ensure_init()?;

        let file = self.catalog.lookup(name).ok_or(FsError::NotFound)?;
        let entry = self
            .catalog
            .find_entry(file, claimed_owner)
            .ok_or(FsError::PermissionDenied)?;
        if !self.catalog.perm(entry).flags.grants(Perm::CREATOR) {
            return Err(FsError::PermissionDenied);
        }
        Ok(())
    }

    /// Captures the current access-control state for debugging
    pub fn dump(&self) -> FsSnapshot {
        self.backend.dump();
        snapshot::capture(&self.catalog, &self.fds, self.initialized)
    }

    fn ensure_init(&mut self) -> Result<(), FsError> {
        if self.initialized {
            return Ok(());
        }
        log::debug!("initializing access-control state; formatting backend");
        self.catalog.reset();
        self.fds.reset();
        self.backend.format()?;
        self.initialized = true;
        Ok(())
    }

    /// Validates that `fd` is bound and belongs to `caller`
    fn owned_binding(&self, fd: Fd, caller: ModuleId) -> Result<PermSlot, FsError> {
        let entry = match self.fds.get(fd.index()) {
            Some(entry) => entry,
            None => {
                log::warn!("{} is not a bound descriptor", fd);
                return Err(FsError::InvalidDescriptor);
            }
        };
        if self.catalog.perm(entry).subject != caller {
            log::warn!("{} does not belong to {}", fd, caller);
            return Err(FsError::InvalidDescriptor);
        }
        Ok(entry)
    }

    fn require_flags(&self, entry: PermSlot, required: Perm) -> Result<(), FsError> {
        let have = self.catalog.perm(entry).flags;
        if !have.grants(required) {
            log::warn!("session entry holds {} but needs {}", have, required);
            return Err(FsError::PermissionDenied);
        }
        Ok(())
    }

    /// Opens the backing object and binds the resulting descriptor.
    ///
    /// The backend always gets a full read/write open; rights narrower than
    /// that are enforced by the byte operations. A backend descriptor
    /// outside the table is a contract breach: the stray handle is closed
    /// and the open fails.
    fn bind_backend(&mut self, name: FileName, hint: usize, entry: PermSlot) -> Result<Fd, FsError> {
        let raw = self
            .backend
            .open(name, AccessMode::READ | AccessMode::WRITE, hint)?;
        if !self.fds.in_range(raw) {
            log::warn!("backend descriptor {} out of range; closing it", raw);
            let table_full = self.fds.is_full();
            if let Err(err) = self.backend.close(raw) {
                log::warn!("closing stray backend descriptor failed: {}", err);
            }
            return Err(if table_full {
                FsError::ResourceExhausted(Pool::Descriptors)
            } else {
                FsError::Backend(BackendError::BadDescriptor)
            });
        }

        self.fds.bind(raw, entry);
        let file = self.catalog.perm(entry).file;
        self.catalog.file_mut(file).open_count += 1;
        Ok(Fd::new(raw))
    }

    /// Unbinds a descriptor, fixes session accounting, and closes the
    /// backing object
    fn release(&mut self, raw: usize) -> Result<(), FsError> {
        let entry = self.fds.clear(raw);
        let file = self.catalog.perm(entry).file;
        let record = self.catalog.file_mut(file);
        debug_assert!(record.open_count > 0, "session accounting out of sync");
        record.open_count -= 1;
        self.backend.close(raw)?;
        Ok(())
    }

    /// Revokes `subject`'s entry on a file, force-closing its open sessions.
    ///
    /// Revoking a subject that has no entry is a success: the desired end
    /// state already holds.
    fn revoke(&mut self, file: FileSlot, subject: ModuleId) -> Result<(), FsError> {
        let target = match self.catalog.find_entry(file, subject) {
            None => return Ok(()),
            Some(entry) => entry,
        };
        if self.catalog.perm(target).flags.is_creator() {
            log::warn!("creator permission is non-revocable");
            return Err(FsError::PermissionDenied);
        }

        let still_open: Vec<usize> = self
            .fds
            .bound()
            .filter(|(_, entry)| *entry == target)
            .map(|(fd, _)| fd)
            .collect();
        for fd in still_open {
            log::warn!("revoked entry has an open session; force-closing fd {}", fd);
            if let Err(err) = self.release(fd) {
                // metadata is already consistent; the backend handle is lost
                log::warn!("backend close during revocation failed: {}", err);
            }
        }
        self.catalog.unlink_entry(file, target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use identity::SimIdentityOracle;
    use storage_hal::{FailingStore, FailurePolicy, RamStore};

    const SELF_ID: ModuleId = ModuleId::new(100);
    const ALICE: ModuleId = ModuleId::new(1);
    const BOB: ModuleId = ModuleId::new(2);

    fn name(c: char) -> FileName {
        FileName::new(c)
    }

    fn fresh() -> (EnclaveFs<RamStore, SimIdentityOracle>, SimIdentityOracle) {
        let oracle = SimIdentityOracle::new(SELF_ID);
        oracle.switch_caller(ALICE);
        let fs = EnclaveFs::new(RamStore::new(), oracle.clone());
        (fs, oracle)
    }

    #[test]
    fn test_init_is_idempotent() {
        let (mut fs, _oracle) = fresh();
        fs.init().unwrap();
        fs.open(name('a'), Perm::CREATOR, OpenSize::Bytes(10)).unwrap();

        // re-initialization must not wipe state
        fs.init().unwrap();
        assert_eq!(fs.dump().files.len(), 1);
    }

    #[test]
    fn test_open_existing_only_on_absent_name() {
        let (mut fs, _oracle) = fresh();
        assert_eq!(
            fs.open(name('z'), Perm::READ, OpenSize::ExistingOnly),
            Err(FsError::NotFound)
        );
    }

    #[test]
    fn test_create_write_seek_read() {
        let (mut fs, _oracle) = fresh();
        let fd = fs.open(name('a'), Perm::CREATOR, OpenSize::Bytes(16)).unwrap();
        fs.putc(fd, b'h').unwrap();
        fs.putc(fd, b'i').unwrap();

        assert_eq!(fs.seek(fd, 0, Whence::Set).unwrap(), 0);
        assert_eq!(fs.getc(fd).unwrap(), Some(b'h'));
        assert_eq!(fs.getc(fd).unwrap(), Some(b'i'));
        assert_eq!(fs.getc(fd).unwrap(), None, "end of file");
        fs.close(fd).unwrap();
    }

    #[test]
    fn test_foreign_descriptor_rejected() {
        let (mut fs, oracle) = fresh();
        let fd = fs.open(name('a'), Perm::CREATOR, OpenSize::Bytes(4)).unwrap();

        oracle.switch_caller(BOB);
        assert_eq!(fs.close(fd), Err(FsError::InvalidDescriptor));
        assert_eq!(fs.getc(fd), Err(FsError::InvalidDescriptor));
        assert_eq!(fs.putc(fd, 0), Err(FsError::InvalidDescriptor));
        assert_eq!(fs.seek(fd, 0, Whence::Set), Err(FsError::InvalidDescriptor));

        oracle.switch_caller(ALICE);
        fs.close(fd).unwrap();
    }

    #[test]
    fn test_unbound_descriptor_rejected() {
        let (mut fs, _oracle) = fresh();
        let fd = fs.open(name('a'), Perm::CREATOR, OpenSize::Bytes(4)).unwrap();
        fs.close(fd).unwrap();
        assert_eq!(fs.close(fd), Err(FsError::InvalidDescriptor));
    }

    #[test]
    fn test_write_only_grant_cannot_read() {
        let (mut fs, oracle) = fresh();
        fs.open(name('a'), Perm::CREATOR, OpenSize::Bytes(4)).unwrap();
        fs.chmod(name('a'), BOB, Perm::WRITE).unwrap();

        oracle.switch_caller(BOB);
        let fd = fs.open(name('a'), Perm::WRITE, OpenSize::ExistingOnly).unwrap();
        fs.putc(fd, b'x').unwrap();
        assert_eq!(fs.getc(fd), Err(FsError::PermissionDenied));
        fs.close(fd).unwrap();
    }

    #[test]
    fn test_backend_failure_rolls_back_creation() {
        let oracle = SimIdentityOracle::new(SELF_ID);
        oracle.switch_caller(ALICE);
        let backend = FailingStore::new(RamStore::new(), FailurePolicy::OnNames(vec![name('x')]));
        let mut fs = EnclaveFs::new(backend, oracle.clone());

        assert_eq!(
            fs.open(name('x'), Perm::CREATOR, OpenSize::Bytes(4)),
            Err(FsError::Backend(BackendError::Io))
        );

        let snapshot = fs.dump();
        assert!(snapshot.files.is_empty(), "no half-created file may remain");
        assert_eq!(snapshot.free_files, FsLimits::default().max_files);
        assert_eq!(snapshot.free_perms, FsLimits::default().max_perms);

        // the name is usable once the backend recovers
        fs.backend_mut().set_policy(FailurePolicy::Never);
        let fd = fs.open(name('x'), Perm::CREATOR, OpenSize::Bytes(4)).unwrap();
        fs.close(fd).unwrap();
    }

    #[test]
    fn test_descriptor_table_exhaustion() {
        let oracle = SimIdentityOracle::new(SELF_ID);
        oracle.switch_caller(ALICE);
        let limits = FsLimits {
            max_open: 2,
            ..FsLimits::default()
        };
        let mut fs = EnclaveFs::with_limits(RamStore::new(), oracle.clone(), limits);

        fs.open(name('a'), Perm::CREATOR, OpenSize::Bytes(4)).unwrap();
        fs.open(name('a'), Perm::CREATOR, OpenSize::ExistingOnly).unwrap();
        assert_eq!(
            fs.open(name('a'), Perm::CREATOR, OpenSize::ExistingOnly),
            Err(FsError::ResourceExhausted(Pool::Descriptors))
        );
    }

    #[test]
    fn test_open_sessions_counted_in_snapshot() {
        let (mut fs, _oracle) = fresh();
        let fd0 = fs.open(name('a'), Perm::CREATOR, OpenSize::Bytes(4)).unwrap();
        let fd1 = fs.open(name('a'), Perm::CREATOR, OpenSize::ExistingOnly).unwrap();

        let snapshot = fs.dump();
        assert_eq!(snapshot.file(name('a')).unwrap().open_count, 2);
        assert_eq!(snapshot.descriptors.len(), 2);

        fs.close(fd0).unwrap();
        fs.close(fd1).unwrap();
        assert_eq!(fs.dump().file(name('a')).unwrap().open_count, 0);
    }

    #[test]
    fn test_attest_confirms_creator_only() {
        let (mut fs, _oracle) = fresh();
        fs.open(name('a'), Perm::CREATOR, OpenSize::Bytes(4)).unwrap();
        fs.chmod(name('a'), BOB, Perm::ROOT).unwrap();

        assert!(fs.attest(name('a'), ALICE).is_ok());
        assert_eq!(fs.attest(name('a'), BOB), Err(FsError::PermissionDenied));
        assert_eq!(fs.attest(name('z'), ALICE), Err(FsError::NotFound));
    }

    #[test]
    fn test_remove_requires_root() {
        let (mut fs, oracle) = fresh();
        let fd = fs.open(name('a'), Perm::CREATOR, OpenSize::Bytes(4)).unwrap();
        fs.close(fd).unwrap();
        fs.chmod(name('a'), BOB, Perm::READ).unwrap();

        oracle.switch_caller(BOB);
        assert_eq!(fs.remove(name('a')), Err(FsError::PermissionDenied));

        oracle.switch_caller(ALICE);
        fs.remove(name('a')).unwrap();
        assert_eq!(fs.remove(name('a')), Err(FsError::NotFound));
    }

    #[test]
    fn test_remove_clears_backend_object() {
        let (mut fs, _oracle) = fresh();
        let fd = fs.open(name('a'), Perm::CREATOR, OpenSize::Bytes(4)).unwrap();
        fs.putc(fd, b'x').unwrap();
        fs.close(fd).unwrap();
        fs.remove(name('a')).unwrap();
        assert_eq!(fs.backend().object_len(name('a')), None);
    }
}
