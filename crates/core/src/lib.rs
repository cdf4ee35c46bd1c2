//! Pure domain logic for the dispatch engine.
//!
//! No I/O lives here: this crate holds the shared primitive types, the
//! domain error taxonomy, role constants, and the validation helpers used
//! by both the DB and API layers.

pub mod error;
pub mod geo;
pub mod offer;
pub mod rating;
pub mod request;
pub mod roles;
pub mod types;
pub mod urgency;
