//! # Core Types
//!
//! This crate defines the fundamental types shared across EnclaveFS.
//!
//! ## Philosophy
//!
//! Core types are designed with these principles:
//! - **Explicit over implicit**: Permissions are typed masks, not bare ints.
//! - **Type safety first**: Names, masks, and seek origins cannot be confused.
//! - **Register-sized values**: Everything here crosses the enclave boundary
//!   by value, so types stay small enough for a CPU register.
//!
//! ## Key Types
//!
//! - [`FileName`]: Logical file name in the flat namespace
//! - [`Perm`]: Permission-flag bitmask attached to ACL entries
//! - [`Whence`]: Seek origin for file-position moves

pub mod name;
pub mod perm;
pub mod seek;

pub use name::FileName;
pub use perm::Perm;
pub use seek::Whence;
