//! # Storage HAL
//!
//! This crate defines the storage backend boundary for EnclaveFS.
//!
//! ## Philosophy
//!
//! **The backend stores bytes; the front end decides who may touch them.**
//!
//! A backend is a dumb byte store with a POSIX-like contract. It performs no
//! access control of its own: the access-control core always opens backing
//! objects with full read/write access and enforces the finer-grained
//! permissions itself, before any backend call is made. Backends are chosen
//! at configuration time and never swapped at runtime.
//!
//! ## Design Principles
//!
//! 1. **Trait-based**: all storage goes through [`StorageBackend`]
//! 2. **Dense descriptors**: backends hand out small, reusable integers
//! 3. **Swappable**: RAM, flash, shared-memory backends all fit one contract
//! 4. **Testable**: reference backends in this crate run anywhere
//!
//! ## Reference Backends
//!
//! - [`RamStore`]: in-memory byte store, the default for tests and demos
//! - [`NullStore`]: accepts everything and stores nothing; isolates
//!   front-end overhead in measurements
//! - [`FailingStore`]: wraps another backend and injects faults on a
//!   configurable policy

pub mod backend;
pub mod failing;
pub mod null;
pub mod ram;

pub use backend::{AccessMode, BackendError, StorageBackend};
pub use failing::{FailingStore, FailurePolicy};
pub use null::NullStore;
pub use ram::RamStore;
