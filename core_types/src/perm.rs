//! Permission-flag bitmask for ACL entries

use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// Permission flags attached to one ACL entry.
    ///
    /// Flags combine by bitwise OR. Two of the masks are special:
    ///
    /// - `CREATOR` is the maximal permission, granted automatically to the
    ///   module that first creates a file. It is never assignable nor
    ///   revocable; it only disappears when the file itself is destroyed.
    /// - `ROOT` is every permission *except* the creator bit: the maximal
    ///   transferable authority, required to mutate a file's ACL or remove
    ///   the file.
    ///
    /// The mask is deliberately one byte so it transfers through a CPU
    /// register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Perm: u8 {
        /// Read access to file contents
        const READ = 0x01;
        /// Write access to file contents
        const WRITE = 0x02;
        /// All transferable permissions; authority to chmod and remove
        const ROOT = 0x7F;
        /// All permissions including the non-transferable creator bit
        const CREATOR = 0xFF;
    }
}

impl Perm {
    /// No permissions at all
    pub const NIL: Perm = Perm::empty();

    /// Checks that this mask grants everything in `required`.
    ///
    /// This is the bitwise superset test used by every access check:
    /// `(have & want) == want`.
    pub fn grants(self, required: Perm) -> bool {
        self.contains(required)
    }

    /// True for the exact creator mask (not merely a superset of it)
    pub fn is_creator(self) -> bool {
        self == Perm::CREATOR
    }
}

impl fmt::Display for Perm {
    /// Renders as the raw hex mask, the form operators grep logs for.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.bits())
    }
}
