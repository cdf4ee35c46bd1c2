//! Nurse offer entity model and DTOs.

use medidispatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `nurse_offers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NurseOffer {
    pub id: DbId,
    pub request_id: DbId,
    pub nurse_id: DbId,
    /// Offered price in whole currency units.
    pub price: i64,
    pub eta_minutes: i32,
    pub message: Option<String>,
    pub distance_km: Option<f64>,
    pub status_id: StatusId,
    pub created_at: Timestamp,
}

/// DTO for submitting an offer via `POST /api/v1/requests/{id}/offers`.
#[derive(Debug, Deserialize)]
pub struct CreateNurseOffer {
    pub price: i64,
    pub eta_minutes: i32,
    pub message: Option<String>,
    pub distance_km: Option<f64>,
}
