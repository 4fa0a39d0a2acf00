//! Directory and ACL management
//!
//! The catalog owns both record arenas and every piece of access-control
//! metadata: which logical files exist, and who may do what to each of
//! them. All mutation goes through methods that preserve the creator
//! invariant — every live file has exactly one ACL entry whose flags equal
//! the creator mask, present from the moment the file is created until the
//! moment it is destroyed.

use crate::arena::Arena;
use crate::error::{FsError, Pool};
use core_types::{FileName, Perm};
use identity::ModuleId;

/// Stable handle to a live file record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FileSlot(pub(crate) usize);

/// Stable handle to a live permission record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PermSlot(pub(crate) usize);

/// One logical file: its name, session accounting, and the head of its ACL.
///
/// Files form a singly linked chain rooted at the catalog head; ACL entries
/// form a singly linked chain rooted at `acl`. `acl` is `None` only in the
/// instants between allocation and linking inside [`Catalog::create_file`].
#[derive(Debug)]
pub(crate) struct FileRecord {
    pub(crate) name: FileName,
    pub(crate) open_count: usize,
    pub(crate) acl: Option<PermSlot>,
    pub(crate) next: Option<FileSlot>,
}

/// One ACL entry: a subject and what it may do to the owning file
#[derive(Debug)]
pub(crate) struct PermRecord {
    pub(crate) subject: ModuleId,
    pub(crate) flags: Perm,
    pub(crate) file: FileSlot,
    pub(crate) next: Option<PermSlot>,
}

/// Access-control metadata store: the file directory plus every ACL.
#[derive(Debug)]
pub(crate) struct Catalog {
    files: Arena<FileRecord>,
    perms: Arena<PermRecord>,
    head: Option<FileSlot>,
}

impl Catalog {
    pub(crate) fn new(max_files: usize, max_perms: usize) -> Self {
        Self {
            files: Arena::with_capacity(max_files),
            perms: Arena::with_capacity(max_perms),
            head: None,
        }
    }

    /// Drops all metadata and restores both pools to full capacity
    pub(crate) fn reset(&mut self) {
        self.files.reset();
        self.perms.reset();
        self.head = None;
    }

    pub(crate) fn file(&self, slot: FileSlot) -> &FileRecord {
        self.files.get(slot.0)
    }

    pub(crate) fn file_mut(&mut self, slot: FileSlot) -> &mut FileRecord {
        self.files.get_mut(slot.0)
    }

    pub(crate) fn perm(&self, slot: PermSlot) -> &PermRecord {
        self.perms.get(slot.0)
    }

    pub(crate) fn free_files(&self) -> usize {
        self.files.free_count()
    }

    pub(crate) fn free_perms(&self) -> usize {
        self.perms.free_count()
    }

    /// Iterates the live files in directory order
    pub(crate) fn iter_files(&self) -> impl Iterator<Item = FileSlot> + '_ {
        std::iter::successors(self.head, move |slot| self.file(*slot).next)
    }

    /// Iterates one file's ACL in insertion order
    pub(crate) fn iter_acl(&self, file: FileSlot) -> impl Iterator<Item = PermSlot> + '_ {
        std::iter::successors(self.file(file).acl, move |slot| self.perm(*slot).next)
    }

    /// Resolves a name to its file by linear directory scan
    pub(crate) fn lookup(&self, name: FileName) -> Option<FileSlot> {
        self.iter_files().find(|slot| self.file(*slot).name == name)
    }

    /// Like [`lookup`](Self::lookup), additionally yielding the chain
    /// predecessor needed to splice the file out on removal
    pub(crate) fn lookup_with_predecessor(
        &self,
        name: FileName,
    ) -> Option<(FileSlot, Option<FileSlot>)> {
        let mut prev = None;
        for slot in self.iter_files() {
            if self.file(slot).name == name {
                return Some((slot, prev));
            }
            prev = Some(slot);
        }
        None
    }

    /// Finds the ACL entry for `subject`, if any.
    ///
    /// Subjects are never duplicated within one ACL, so the first match is
    /// the only match.
    pub(crate) fn find_entry(&self, file: FileSlot, subject: ModuleId) -> Option<PermSlot> {
        self.iter_acl(file)
            .find(|slot| self.perm(*slot).subject == subject)
    }

    /// Two-phase access check: resolve the file, resolve the subject's ACL
    /// entry, and require `required` to be covered by its flags.
    pub(crate) fn resolve_permission(
        &self,
        name: FileName,
        subject: ModuleId,
        required: Perm,
    ) -> Result<PermSlot, FsError> {
        self.resolve_with_predecessor(name, subject, required)
            .map(|(entry, _, _)| entry)
    }

    /// Two-phase access check that also yields the file and its directory
    /// predecessor, for callers about to splice the file out.
    pub(crate) fn resolve_with_predecessor(
        &self,
        name: FileName,
        subject: ModuleId,
        required: Perm,
    ) -> Result<(PermSlot, FileSlot, Option<FileSlot>), FsError> {
        let (slot, prev) = self
            .lookup_with_predecessor(name)
            .ok_or(FsError::NotFound)?;
        let entry = match self.find_entry(slot, subject) {
            Some(entry) => entry,
            None => {
                log::warn!("{}: no ACL entry for {}", name, subject);
                return Err(FsError::PermissionDenied);
            }
        };
        let have = self.perm(entry).flags;
        if !have.grants(required) {
            log::warn!("{}: {} holds {} but needs {}", name, subject, have, required);
            return Err(FsError::PermissionDenied);
        }
        Ok((entry, slot, prev))
    }

    /// Creates a file and its creator ACL entry as one step.
    ///
    /// The new file is pushed at the directory head. Allocation is atomic:
    /// if the permission pool is exhausted the file record is returned
    /// before anything becomes observable.
    pub(crate) fn create_file(
        &mut self,
        name: FileName,
        creator: ModuleId,
    ) -> Result<(FileSlot, PermSlot), FsError> {
        debug_assert!(self.lookup(name).is_none(), "duplicate live file name");

        let file = FileSlot(
            self.files
                .alloc(FileRecord {
                    name,
                    open_count: 0,
                    acl: None,
                    next: self.head,
                })
                .ok_or(FsError::ResourceExhausted(Pool::Files))?,
        );
        let entry = match self.perms.alloc(PermRecord {
            subject: creator,
            flags: Perm::CREATOR,
            file,
            next: None,
        }) {
            Some(index) => PermSlot(index),
            None => {
                self.files.release(file.0);
                return Err(FsError::ResourceExhausted(Pool::Permissions));
            }
        };
        self.files.get_mut(file.0).acl = Some(entry);
        self.head = Some(file);
        log::debug!("created {} with creator {}", name, creator);
        Ok((file, entry))
    }

    /// Adds or overwrites the ACL entry for `subject`.
    ///
    /// The creator mask is non-assignable and an existing creator entry is
    /// non-overridable; both attempts fail without touching the ACL. A new
    /// entry is appended at the tail, keeping the creator entry first.
    pub(crate) fn grant(
        &mut self,
        file: FileSlot,
        subject: ModuleId,
        flags: Perm,
    ) -> Result<(), FsError> {
        if flags.is_creator() {
            log::warn!("creator permission is non-assignable");
            return Err(FsError::PermissionDenied);
        }

        let mut tail = None;
        let mut cur = self.file(file).acl;
        while let Some(slot) = cur {
            let record = self.perm(slot);
            let next = record.next;
            if record.subject == subject {
                if record.flags.is_creator() {
                    log::warn!("creator permission is non-overridable");
                    return Err(FsError::PermissionDenied);
                }
                self.perms.get_mut(slot.0).flags = flags;
                return Ok(());
            }
            tail = Some(slot);
            cur = next;
        }

        let entry = PermSlot(
            self.perms
                .alloc(PermRecord {
                    subject,
                    flags,
                    file,
                    next: None,
                })
                .ok_or(FsError::ResourceExhausted(Pool::Permissions))?,
        );
        // the ACL always holds at least the creator entry, so the tail exists
        let tail = tail.expect("live file with an empty ACL");
        self.perms.get_mut(tail.0).next = Some(entry);
        Ok(())
    }

    /// Unlinks and frees one non-creator ACL entry.
    ///
    /// The caller has already rejected creator entries and force-closed any
    /// descriptors still bound to this one.
    pub(crate) fn unlink_entry(&mut self, file: FileSlot, target: PermSlot) {
        debug_assert!(!self.perm(target).flags.is_creator());

        let mut prev: Option<PermSlot> = None;
        let mut cur = self.file(file).acl;
        while let Some(slot) = cur {
            if slot == target {
                let next = self.perm(slot).next;
                match prev {
                    None => self.files.get_mut(file.0).acl = next,
                    Some(p) => self.perms.get_mut(p.0).next = next,
                }
                self.perms.release(slot.0);
                return;
            }
            prev = cur;
            cur = self.perm(slot).next;
        }
        debug_assert!(false, "entry not on its file's ACL");
    }

    /// Destroys a file: splices it out of the directory and returns it and
    /// its whole ACL to the pools.
    ///
    /// `prev` is the chain predecessor from
    /// [`lookup_with_predecessor`](Self::lookup_with_predecessor). The file
    /// must have no open sessions left.
    pub(crate) fn remove_file(&mut self, slot: FileSlot, prev: Option<FileSlot>) {
        debug_assert_eq!(self.file(slot).open_count, 0, "removing a busy file");

        let next = self.file(slot).next;
        match prev {
            None => self.head = next,
            Some(p) => self.files.get_mut(p.0).next = next,
        }

        let mut cur = self.file(slot).acl;
        while let Some(entry) = cur {
            cur = self.perm(entry).next;
            self.perms.release(entry.0);
        }
        let record = self.files.release(slot.0);
        log::debug!("removed {}", record.name);
    }

    /// True when every live file carries exactly one creator entry
    pub(crate) fn creator_invariant_holds(&self) -> bool {
        self.iter_files().all(|file| {
            self.iter_acl(file)
                .filter(|slot| self.perm(*slot).flags.is_creator())
                .count()
                == 1
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(3, 6)
    }

    fn name(c: char) -> FileName {
        FileName::new(c)
    }

    const ALICE: ModuleId = ModuleId::new(1);
    const BOB: ModuleId = ModuleId::new(2);

    #[test]
    fn test_create_and_lookup() {
        let mut cat = catalog();
        let (file, entry) = cat.create_file(name('a'), ALICE).unwrap();
        assert_eq!(cat.lookup(name('a')), Some(file));
        assert_eq!(cat.lookup(name('b')), None);
        assert_eq!(cat.perm(entry).flags, Perm::CREATOR);
        assert!(cat.creator_invariant_holds());
    }

    #[test]
    fn test_lookup_with_predecessor_orders_newest_first() {
        let mut cat = catalog();
        let (first, _) = cat.create_file(name('a'), ALICE).unwrap();
        let (second, _) = cat.create_file(name('b'), ALICE).unwrap();

        // newest file sits at the head, so it has no predecessor
        assert_eq!(cat.lookup_with_predecessor(name('b')), Some((second, None)));
        assert_eq!(
            cat.lookup_with_predecessor(name('a')),
            Some((first, Some(second)))
        );
    }

    #[test]
    fn test_file_pool_exhaustion() {
        let mut cat = Catalog::new(1, 6);
        cat.create_file(name('a'), ALICE).unwrap();
        assert_eq!(
            cat.create_file(name('b'), ALICE),
            Err(FsError::ResourceExhausted(Pool::Files))
        );
    }

    #[test]
    fn test_perm_pool_exhaustion_rolls_back_file() {
        let mut cat = Catalog::new(2, 1);
        cat.create_file(name('a'), ALICE).unwrap();
        let free_before = cat.free_files();
        assert_eq!(
            cat.create_file(name('b'), ALICE),
            Err(FsError::ResourceExhausted(Pool::Permissions))
        );
        assert_eq!(cat.free_files(), free_before, "file slot must be returned");
        assert_eq!(cat.lookup(name('b')), None);
    }

    #[test]
    fn test_resolve_permission_chain() {
        let mut cat = catalog();
        let (file, _) = cat.create_file(name('a'), ALICE).unwrap();

        assert_eq!(
            cat.resolve_permission(name('z'), ALICE, Perm::READ),
            Err(FsError::NotFound)
        );
        assert_eq!(
            cat.resolve_permission(name('a'), BOB, Perm::READ),
            Err(FsError::PermissionDenied)
        );

        cat.grant(file, BOB, Perm::READ).unwrap();
        assert!(cat.resolve_permission(name('a'), BOB, Perm::READ).is_ok());
        assert_eq!(
            cat.resolve_permission(name('a'), BOB, Perm::WRITE),
            Err(FsError::PermissionDenied)
        );
        // the creator mask covers every requirement
        assert!(cat.resolve_permission(name('a'), ALICE, Perm::ROOT).is_ok());
    }

    #[test]
    fn test_grant_appends_and_overwrites() {
        let mut cat = catalog();
        let (file, _) = cat.create_file(name('a'), ALICE).unwrap();

        cat.grant(file, BOB, Perm::READ).unwrap();
        let entry = cat.find_entry(file, BOB).unwrap();
        assert_eq!(cat.perm(entry).flags, Perm::READ);

        cat.grant(file, BOB, Perm::READ | Perm::WRITE).unwrap();
        let entry = cat.find_entry(file, BOB).unwrap();
        assert_eq!(cat.perm(entry).flags, Perm::READ | Perm::WRITE);

        // still two entries, creator first
        let acl: Vec<_> = cat.iter_acl(file).collect();
        assert_eq!(acl.len(), 2);
        assert_eq!(cat.perm(acl[0]).subject, ALICE);
        assert!(cat.creator_invariant_holds());
    }

    #[test]
    fn test_grant_creator_mask_rejected() {
        let mut cat = catalog();
        let (file, _) = cat.create_file(name('a'), ALICE).unwrap();
        assert_eq!(
            cat.grant(file, BOB, Perm::CREATOR),
            Err(FsError::PermissionDenied)
        );
        cat.grant(file, BOB, Perm::READ).unwrap();
        assert_eq!(
            cat.grant(file, BOB, Perm::CREATOR),
            Err(FsError::PermissionDenied)
        );
        assert!(cat.creator_invariant_holds());
    }

    #[test]
    fn test_grant_on_creator_entry_rejected() {
        let mut cat = catalog();
        let (file, _) = cat.create_file(name('a'), ALICE).unwrap();
        assert_eq!(
            cat.grant(file, ALICE, Perm::READ),
            Err(FsError::PermissionDenied)
        );
        let entry = cat.find_entry(file, ALICE).unwrap();
        assert_eq!(cat.perm(entry).flags, Perm::CREATOR, "entry untouched");
    }

    #[test]
    fn test_unlink_entry_keeps_chain_intact() {
        let mut cat = catalog();
        let (file, _) = cat.create_file(name('a'), ALICE).unwrap();
        cat.grant(file, BOB, Perm::READ).unwrap();
        cat.grant(file, ModuleId::new(3), Perm::WRITE).unwrap();

        let bob_entry = cat.find_entry(file, BOB).unwrap();
        let free_before = cat.free_perms();
        cat.unlink_entry(file, bob_entry);

        assert_eq!(cat.free_perms(), free_before + 1);
        assert!(cat.find_entry(file, BOB).is_none());
        assert!(cat.find_entry(file, ModuleId::new(3)).is_some());
        assert!(cat.creator_invariant_holds());
    }

    #[test]
    fn test_remove_file_cascades_acl() {
        let mut cat = catalog();
        let (file, _) = cat.create_file(name('a'), ALICE).unwrap();
        cat.grant(file, BOB, Perm::READ).unwrap();

        let (slot, prev) = cat.lookup_with_predecessor(name('a')).unwrap();
        cat.remove_file(slot, prev);

        assert_eq!(cat.lookup(name('a')), None);
        assert_eq!(cat.free_files(), 3);
        assert_eq!(cat.free_perms(), 6);
    }

    #[test]
    fn test_remove_middle_file_splices_chain() {
        let mut cat = catalog();
        cat.create_file(name('a'), ALICE).unwrap();
        cat.create_file(name('b'), ALICE).unwrap();
        cat.create_file(name('c'), ALICE).unwrap();

        let (slot, prev) = cat.lookup_with_predecessor(name('b')).unwrap();
        cat.remove_file(slot, prev);

        assert!(cat.lookup(name('a')).is_some());
        assert_eq!(cat.lookup(name('b')), None);
        assert!(cat.lookup(name('c')).is_some());
        assert_eq!(cat.iter_files().count(), 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut cat = catalog();
        cat.create_file(name('a'), ALICE).unwrap();
        cat.reset();
        assert_eq!(cat.lookup(name('a')), None);
        assert_eq!(cat.free_files(), 3);
        assert_eq!(cat.free_perms(), 6);
    }
}
