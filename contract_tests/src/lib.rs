//! # Service Contract Tests
//!
//! This crate provides "golden" tests for the EnclaveFS front-end contract
//! to ensure it doesn't drift accidentally over time.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: The access-control contract is written as
//!   executable scenarios
//! - **Testability first**: Contract tests fail when observable behavior
//!   changes
//! - **Adversarial by default**: Scenarios are played by multiple mutually
//!   distrusting subjects, switched through the simulated identity oracle
//!
//! ## Structure
//!
//! Each module pins one service's contract. `enclave_fs` covers the
//! access-control core: the creator invariant, session accounting, the
//! error taxonomy, and the multi-subject sharing scenarios.

pub mod enclave_fs;

/// Common helpers for contract scenarios
pub mod test_helpers {
    use identity::{ModuleId, SimIdentityOracle};
    use services_enclave_fs::EnclaveFs;
    use storage_hal::RamStore;

    /// Identity of the module hosting the service itself
    pub const SERVICE: ModuleId = ModuleId::new(100);
    /// First client subject (plays the file creator in most scenarios)
    pub const SUBJECT1: ModuleId = ModuleId::new(1);
    /// Second client subject
    pub const SUBJECT2: ModuleId = ModuleId::new(2);
    /// Third client subject
    pub const SUBJECT3: ModuleId = ModuleId::new(3);

    /// Creates a fresh service over an in-memory backend, plus an oracle
    /// handle for switching the apparent caller. The initial caller is
    /// [`SUBJECT1`].
    pub fn fresh_fs() -> (EnclaveFs<RamStore, SimIdentityOracle>, SimIdentityOracle) {
        let oracle = SimIdentityOracle::new(SERVICE);
        oracle.switch_caller(SUBJECT1);
        let fs = EnclaveFs::new(RamStore::new(), oracle.clone());
        (fs, oracle)
    }
}
