//! Debug introspection snapshots
//!
//! `dump()` produces a structured, serializable picture of the live
//! access-control state instead of writing to a console. Tests use it to
//! assert invariants; operators can log or ship it as JSON.

use crate::catalog::Catalog;
use crate::descriptor::DescriptorTable;
use core::fmt;
use core_types::{FileName, Perm};
use identity::ModuleId;
use serde::{Deserialize, Serialize};

/// One ACL entry as captured by `dump()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntrySnapshot {
    /// Subject the entry belongs to
    pub subject: ModuleId,
    /// Raw permission mask bits
    pub flags: u8,
}

/// One live file as captured by `dump()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// The file's name
    pub name: FileName,
    /// Number of sessions currently open on the file
    pub open_count: usize,
    /// The ACL in insertion order (creator entry first)
    pub acl: Vec<AclEntrySnapshot>,
}

impl FileSnapshot {
    /// Number of ACL entries carrying the exact creator mask
    pub fn creator_count(&self) -> usize {
        self.acl
            .iter()
            .filter(|entry| entry.flags == Perm::CREATOR.bits())
            .count()
    }
}

/// One bound descriptor as captured by `dump()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSnapshot {
    /// Table index of the descriptor
    pub fd: usize,
    /// File the session is open on
    pub name: FileName,
    /// Module the session belongs to
    pub subject: ModuleId,
}

/// Full picture of the access-control state at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsSnapshot {
    /// Whether lazy initialization has run yet
    pub initialized: bool,
    /// Live files in directory order (newest first)
    pub files: Vec<FileSnapshot>,
    /// Currently bound descriptors
    pub descriptors: Vec<DescriptorSnapshot>,
    /// Free slots left in the file pool
    pub free_files: usize,
    /// Free slots left in the permission pool
    pub free_perms: usize,
}

impl FsSnapshot {
    /// Finds the snapshot of a file by name (test convenience)
    pub fn file(&self, name: FileName) -> Option<&FileSnapshot> {
        self.files.iter().find(|file| file.name == name)
    }
}

impl fmt::Display for FsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "enclave-fs state (init={}, free files={}, free perms={})",
            self.initialized, self.free_files, self.free_perms
        )?;
        for file in &self.files {
            writeln!(f, "  file {} open_count={}", file.name, file.open_count)?;
            for entry in &file.acl {
                writeln!(f, "    perm ({}, {:#04x})", entry.subject, entry.flags)?;
            }
        }
        for desc in &self.descriptors {
            writeln!(f, "  fd {} -> {} ({})", desc.fd, desc.name, desc.subject)?;
        }
        Ok(())
    }
}

/// Captures the current state of the catalog and descriptor table
pub(crate) fn capture(
    catalog: &Catalog,
    descriptors: &DescriptorTable,
    initialized: bool,
) -> FsSnapshot {
    let files = catalog
        .iter_files()
        .map(|slot| {
            let record = catalog.file(slot);
            FileSnapshot {
                name: record.name,
                open_count: record.open_count,
                acl: catalog
                    .iter_acl(slot)
                    .map(|entry| {
                        let perm = catalog.perm(entry);
                        AclEntrySnapshot {
                            subject: perm.subject,
                            flags: perm.flags.bits(),
                        }
                    })
                    .collect(),
            }
        })
        .collect();

    let descriptors = descriptors
        .bound()
        .map(|(fd, entry)| {
            let perm = catalog.perm(entry);
            DescriptorSnapshot {
                fd,
                name: catalog.file(perm.file).name,
                subject: perm.subject,
            }
        })
        .collect();

    FsSnapshot {
        initialized,
        files,
        descriptors,
        free_files: catalog.free_files(),
        free_perms: catalog.free_perms(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serializes_to_json() {
        let snapshot = FsSnapshot {
            initialized: true,
            files: vec![FileSnapshot {
                name: FileName::new('a'),
                open_count: 1,
                acl: vec![AclEntrySnapshot {
                    subject: ModuleId::new(1),
                    flags: Perm::CREATOR.bits(),
                }],
            }],
            descriptors: vec![],
            free_files: 4,
            free_perms: 9,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: FsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_creator_count() {
        let file = FileSnapshot {
            name: FileName::new('a'),
            open_count: 0,
            acl: vec![
                AclEntrySnapshot {
                    subject: ModuleId::new(1),
                    flags: Perm::CREATOR.bits(),
                },
                AclEntrySnapshot {
                    subject: ModuleId::new(2),
                    flags: Perm::ROOT.bits(),
                },
            ],
        };
        assert_eq!(file.creator_count(), 1);
    }

    #[test]
    fn test_display_lists_files() {
        let snapshot = FsSnapshot {
            initialized: true,
            files: vec![FileSnapshot {
                name: FileName::new('a'),
                open_count: 0,
                acl: vec![],
            }],
            descriptors: vec![],
            free_files: 4,
            free_perms: 10,
        };
        let text = snapshot.to_string();
        assert!(text.contains("file 'a'"));
    }
}
