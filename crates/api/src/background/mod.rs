//! Background maintenance tasks.

pub mod expiry;
