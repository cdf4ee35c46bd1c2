//! HTTP request handlers.

pub mod offers;
pub mod requests;
pub mod tracking;
