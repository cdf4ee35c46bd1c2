//! Emergency request entity model and DTOs.

use medidispatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `emergency_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmergencyRequest {
    pub id: DbId,
    pub patient_id: DbId,
    pub patient_name: String,
    pub patient_phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub city: Option<String>,
    pub service_codes: Vec<String>,
    pub urgency: String,
    /// Patient-proposed price in whole currency units.
    pub proposed_price: Option<i64>,
    pub notes: Option<String>,
    pub status_id: StatusId,
    /// Set iff status is accepted, in_progress, or completed.
    pub accepted_offer_id: Option<DbId>,
    pub accepted_nurse_id: Option<DbId>,
    /// 1–5, settable exactly once after completion.
    pub patient_rating: Option<i16>,
    pub patient_review: Option<String>,
    pub tip_amount: Option<i64>,
    pub admin_notes: Option<String>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
}

/// DTO for creating a request via `POST /api/v1/requests`.
#[derive(Debug, Deserialize)]
pub struct CreateEmergencyRequest {
    pub patient_name: String,
    pub patient_phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub city: Option<String>,
    pub service_codes: Vec<String>,
    pub urgency: String,
    pub proposed_price: Option<i64>,
    pub notes: Option<String>,
}

/// DTO for the one-time rating submission.
#[derive(Debug, Deserialize)]
pub struct SubmitRating {
    pub rating: i16,
    pub review: Option<String>,
    pub tip_amount: Option<i64>,
}

/// Query parameters for `GET /api/v1/requests`.
#[derive(Debug, Deserialize)]
pub struct RequestListQuery {
    /// Filter by status ID (e.g. 1 = live, 4 = completed).
    pub status_id: Option<StatusId>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
