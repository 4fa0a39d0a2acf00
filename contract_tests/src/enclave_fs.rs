//! Access-control core contract tests
//!
//! These scenarios pin the observable behavior of the EnclaveFS front end:
//! which operations succeed for which subject, which distinguished error
//! each failure returns, and the invariants every reachable state must
//! satisfy.
