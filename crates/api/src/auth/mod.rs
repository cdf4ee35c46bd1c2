//! Token validation for the external identity collaborator.

pub mod jwt;
