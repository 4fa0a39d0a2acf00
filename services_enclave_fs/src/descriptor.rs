//! Open-session descriptor table

use crate::catalog::PermSlot;
use core::fmt;

/// Handle to one open session, as returned by `open`.
///
/// Descriptors are small dense integers; a handle is only meaningful to the
/// module it was issued to, and only until that module closes it (or the
/// session is force-closed by a revocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fd(usize);

impl Fd {
    pub(crate) fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Raw table index of this descriptor
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fd:{}", self.0)
    }
}

/// Fixed-size table binding descriptors to ACL entries.
///
/// Indexed directly by the backend-issued descriptor, which the backend
/// contract keeps small, dense, and reused. A bound slot holds the handle
/// of the permission entry the session was opened under; the file is
/// reachable through that entry.
#[derive(Debug)]
pub(crate) struct DescriptorTable {
    slots: Vec<Option<PermSlot>>,
}

impl DescriptorTable {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Unbinds every descriptor
    pub(crate) fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn in_range(&self, fd: usize) -> bool {
        fd < self.slots.len()
    }

    /// True when no descriptor is left to hand out
    pub(crate) fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// The permission entry bound at `fd`, if in range and bound
    pub(crate) fn get(&self, fd: usize) -> Option<PermSlot> {
        self.slots.get(fd).copied().flatten()
    }

    /// Binds `fd` to a permission entry; the slot must be vacant
    pub(crate) fn bind(&mut self, fd: usize, entry: PermSlot) {
        assert!(
            self.slots[fd].is_none(),
            "backend reissued a descriptor that is still bound"
        );
        self.slots[fd] = Some(entry);
    }

    /// Clears a bound slot, returning the entry it held
    pub(crate) fn clear(&mut self, fd: usize) -> PermSlot {
        self.slots[fd]
            .take()
            .expect("cleared a descriptor that is not bound")
    }

    /// Iterates the bound descriptors as `(index, entry)` pairs
    pub(crate) fn bound(&self) -> impl Iterator<Item = (usize, PermSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(fd, slot)| slot.map(|entry| (fd, entry)))
    }
}
