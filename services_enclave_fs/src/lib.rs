//! # EnclaveFS Access-Control Service
//!
//! This crate implements the access-control core of EnclaveFS: a secure
//! file-naming service for mutually distrusting modules inside a
//! hardware-isolated execution environment.
//!
//! ## Philosophy
//!
//! **The backend stores bytes; this core decides who may touch them.**
//!
//! - **Creator is forever**: whichever module first creates a file holds a
//!   permission entry no one — including itself — can reassign or revoke.
//!   It only disappears with the file.
//! - **Identity is fetched, never passed**: the caller's identity comes from
//!   the trusted oracle at each entry point. An identity found in an
//!   argument is data (a grantee, a claimed owner), never authority.
//! - **Fixed pools, explicit failure**: files, ACL entries, and open
//!   sessions live in fixed-capacity pools; running out is a reported
//!   error, not an allocation stall.
//! - **Nothing survives a restart**: access-control state is rebuilt from
//!   scratch on initialization, and the backend is formatted so no stale
//!   data from a previous run is reachable.
//!
//! ## Components
//!
//! - `arena`: fixed-capacity record pools with free-index stacks
//! - `catalog`: the file directory and every ACL (the security mechanism)
//! - `descriptor`: the open-session table
//! - `service`: the [`EnclaveFs`] front end mediating every operation
//! - `snapshot`: serializable debug introspection

mod arena;
mod catalog;
mod descriptor;
mod error;
mod service;
mod snapshot;

pub use descriptor::Fd;
pub use error::{FsError, Pool};
pub use service::{EnclaveFs, FsLimits, OpenSize};
pub use snapshot::{AclEntrySnapshot, DescriptorSnapshot, FileSnapshot, FsSnapshot};
