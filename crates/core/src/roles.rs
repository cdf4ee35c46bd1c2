//! Role name constants supplied by the identity collaborator's JWT claims.
//!
//! Role alone is never sufficient for a mutation: handlers re-verify
//! resource ownership (the request's own patient, the offer's own nurse)
//! against the row before writing.

/// A patient: creates requests, accepts offers, cancels while live, rates.
pub const ROLE_PATIENT: &str = "patient";

/// A nurse: submits and withdraws offers, advances tracking, completes.
pub const ROLE_NURSE: &str = "nurse";

/// An administrator: may force-cancel any non-terminal request and attach
/// administrative notes.
pub const ROLE_ADMIN: &str = "admin";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_PATIENT, ROLE_NURSE, ROLE_ADMIN];
