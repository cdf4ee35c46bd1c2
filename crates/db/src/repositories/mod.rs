//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Lifecycle transitions return
//! typed outcome enums so handlers can map precisely to 404/409 without
//! parsing error strings.

pub mod dispatch_repo;
pub mod offer_repo;
pub mod request_repo;
pub mod tracking_repo;

pub use dispatch_repo::{AcceptOutcome, DispatchRepo};
pub use offer_repo::{OfferRepo, SubmitOutcome, WithdrawOutcome};
pub use request_repo::{CancelOutcome, CompleteOutcome, RateOutcome, RequestRepo};
pub use tracking_repo::{AdvanceOutcome, TrackingRepo};
