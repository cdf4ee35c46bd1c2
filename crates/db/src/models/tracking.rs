//! Tracking entity model and DTOs.
//!
//! One row per accepted request, created inside the acceptance
//! transaction; status only ever moves forward.

use medidispatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `trackings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tracking {
    pub id: DbId,
    pub request_id: DbId,
    pub nurse_id: DbId,
    pub status_id: StatusId,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Stamped once, on the first transition into `arrived`.
    pub arrived_at: Option<Timestamp>,
    /// Stamped once, on the first transition into `in_service`.
    pub service_started_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

/// DTO for `POST /api/v1/requests/{id}/tracking/advance`.
#[derive(Debug, Deserialize)]
pub struct AdvanceTracking {
    /// Target status ID; must be the current status (no-op) or its
    /// immediate successor.
    pub status_id: StatusId,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
