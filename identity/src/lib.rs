//! # Identity
//!
//! This crate provides module identity primitives for EnclaveFS.
//!
//! ## Philosophy
//!
//! - **Identity is attested by hardware, never claimed by software**
//! - **Identity does NOT grant authority by itself** — authority lives in
//!   per-file permission grants, looked up by identity
//! - **The core never trusts an identity passed as an argument**: the only
//!   trustworthy source is the oracle wired in at construction time
//! - **Testability first; no hidden global state**
//!
//! ## Core Concepts
//!
//! - `ModuleId`: Unique hardware-assigned identifier for an isolated module
//! - `IdentityOracle`: Trusted primitive answering "who is calling right now"
//! - `SimIdentityOracle`: Host-side oracle for tests, with a switchable caller
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - POSIX users, groups, or permissions
//! - Cryptographic attestation or key management
//! - A registry of running modules

use core::cell::Cell;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Unique identifier for an isolated module.
///
/// Assigned by the isolation hardware when a module is loaded and verified;
/// two modules never share an id, and a module cannot influence which id it
/// receives. The raw value is a small integer so it transfers through a CPU
/// register across the trust boundary.
///
/// Holding a `ModuleId` conveys no authority. It only becomes meaningful
/// when an [`IdentityOracle`] vouches that it names the current caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(u16);

impl ModuleId {
    /// Wraps a raw hardware-assigned id
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw id value
    pub const fn as_raw(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module:{}", self.0)
    }
}

/// Trusted source of caller identity.
///
/// The surrounding isolation runtime implements this against the attestation
/// hardware. The contract every implementation must honor:
///
/// - `caller_identity` names the module whose call is currently executing,
///   and is valid only for the duration of that call;
/// - the answer cannot be influenced by the caller's arguments or by any
///   unprotected memory.
///
/// The service fetches the caller exactly once at each entry point and
/// treats the result as an unforgeable capability for that call.
pub trait IdentityOracle {
    /// Returns the identity of the module making the current call
    fn caller_identity(&self) -> ModuleId;

    /// Returns the identity of the module this oracle is embedded in
    fn self_identity(&self) -> ModuleId;
}

/// Simulated identity oracle for host-side tests.
///
/// Plays the role of the isolation runtime: a test harness switches the
/// current caller between operations to act out multi-module scenarios.
/// Clones share one underlying caller cell, so the harness keeps a handle
/// while the service under test owns another.
#[derive(Clone)]
pub struct SimIdentityOracle {
    inner: Rc<SimOracleState>,
}

struct SimOracleState {
    own: ModuleId,
    caller: Cell<ModuleId>,
}

impl SimIdentityOracle {
    /// Creates an oracle for a module with the given identity; the initial
    /// caller is the module itself
    pub fn new(own: ModuleId) -> Self {
        Self {
            inner: Rc::new(SimOracleState {
                own,
                caller: Cell::new(own),
            }),
        }
    }

    /// Switches which module the next calls appear to come from
    pub fn switch_caller(&self, caller: ModuleId) {
        self.inner.caller.set(caller);
    }
}

impl IdentityOracle for SimIdentityOracle {
    fn caller_identity(&self) -> ModuleId {
        self.inner.caller.get()
    }

    fn self_identity(&self) -> ModuleId {
        self.inner.own
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_id_equality() {
        assert_eq!(ModuleId::new(3), ModuleId::new(3));
        assert_ne!(ModuleId::new(3), ModuleId::new(4));
    }

    #[test]
    fn test_module_id_display() {
        assert_eq!(ModuleId::new(7).to_string(), "module:7");
    }

    #[test]
    fn test_module_id_serde_round_trip() {
        let id = ModuleId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: ModuleId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_sim_oracle_initial_caller_is_self() {
        let oracle = SimIdentityOracle::new(ModuleId::new(1));
        assert_eq!(oracle.caller_identity(), ModuleId::new(1));
        assert_eq!(oracle.self_identity(), ModuleId::new(1));
    }

    #[test]
    fn test_sim_oracle_switch_caller() {
        let oracle = SimIdentityOracle::new(ModuleId::new(1));
        oracle.switch_caller(ModuleId::new(9));
        assert_eq!(oracle.caller_identity(), ModuleId::new(9));
        assert_eq!(oracle.self_identity(), ModuleId::new(1));
    }

    #[test]
    fn test_sim_oracle_clones_share_caller() {
        let oracle = SimIdentityOracle::new(ModuleId::new(1));
        let handle = oracle.clone();
        handle.switch_caller(ModuleId::new(5));
        assert_eq!(oracle.caller_identity(), ModuleId::new(5));
    }
}
