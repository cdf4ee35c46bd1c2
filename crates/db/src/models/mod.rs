//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the operations that write to it

pub mod offer;
pub mod request;
pub mod status;
pub mod tracking;
