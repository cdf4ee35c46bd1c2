//! Repository for the `emergency_requests` table.
//!
//! All lifecycle transitions are status-guarded conditional updates: a
//! write either applies against the expected current status or reports a
//! typed outcome the handler maps to 404/409. The live→accepted transition
//! lives in [`DispatchRepo`](super::DispatchRepo), not here.

use medidispatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::request::{
    CreateEmergencyRequest, EmergencyRequest, RequestListQuery, SubmitRating,
};
use crate::models::status::{OfferStatus, RequestStatus, StatusId};

/// Column list for `emergency_requests` queries.
pub(crate) const COLUMNS: &str = "\
    id, patient_id, patient_name, patient_phone, latitude, longitude, \
    address, city, service_codes, urgency, proposed_price, notes, \
    status_id, accepted_offer_id, accepted_nurse_id, \
    patient_rating, patient_review, tip_amount, admin_notes, \
    created_at, completed_at, cancelled_at";

/// Maximum page size for request listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for request listing.
const DEFAULT_LIMIT: i64 = 50;

/// Result of a cancellation attempt.
#[derive(Debug)]
pub enum CancelOutcome {
    /// The request transitioned to cancelled; all open offers were rejected.
    Cancelled(EmergencyRequest),
    /// The request was already completed or cancelled. Idempotent no-op:
    /// no offer statuses changed.
    AlreadyTerminal(EmergencyRequest),
    /// The caller is not allowed to cancel from the current status
    /// (a patient cancelling an already-accepted request).
    NotCancellable(EmergencyRequest),
    NotFound,
}

/// Result of an explicit completion signal.
#[derive(Debug)]
pub enum CompleteOutcome {
    Completed(EmergencyRequest),
    /// The request is not currently in progress.
    InvalidState(EmergencyRequest),
    NotFound,
}

/// Result of a one-time rating submission.
#[derive(Debug)]
pub enum RateOutcome {
    Rated(EmergencyRequest),
    /// A rating has already been captured for this request.
    AlreadyRated(EmergencyRequest),
    /// The request is not completed yet.
    NotCompleted(EmergencyRequest),
    NotFound,
}

/// Provides CRUD and lifecycle operations for emergency requests.
pub struct RequestRepo;

impl RequestRepo {
    /// Create a new live request for a patient.
    pub async fn create(
        pool: &PgPool,
        patient_id: DbId,
        input: &CreateEmergencyRequest,
    ) -> Result<EmergencyRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO emergency_requests \
                (patient_id, patient_name, patient_phone, latitude, longitude, \
                 address, city, service_codes, urgency, proposed_price, notes, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmergencyRequest>(&query)
            .bind(patient_id)
            .bind(&input.patient_name)
            .bind(&input.patient_phone)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(&input.address)
            .bind(&input.city)
            .bind(&input.service_codes)
            .bind(&input.urgency)
            .bind(input.proposed_price)
            .bind(&input.notes)
            .bind(RequestStatus::Live.id())
            .fetch_one(pool)
            .await
    }

    /// Find a request by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<EmergencyRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM emergency_requests WHERE id = $1");
        sqlx::query_as::<_, EmergencyRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a patient's own requests with optional status filter.
    pub async fn list_by_patient(
        pool: &PgPool,
        patient_id: DbId,
        params: &RequestListQuery,
    ) -> Result<Vec<EmergencyRequest>, sqlx::Error> {
        Self::list_requests(pool, Some(patient_id), None, params).await
    }

    /// List currently-live requests (the bidding pool shown to nurses).
    pub async fn list_live(
        pool: &PgPool,
        params: &RequestListQuery,
    ) -> Result<Vec<EmergencyRequest>, sqlx::Error> {
        Self::list_requests(pool, None, Some(RequestStatus::Live.id()), params).await
    }

    /// List all requests (admin view) with optional status filter.
    pub async fn list_all(
        pool: &PgPool,
        params: &RequestListQuery,
    ) -> Result<Vec<EmergencyRequest>, sqlx::Error> {
        Self::list_requests(pool, None, params.status_id, params).await
    }

    /// Shared listing query builder.
    async fn list_requests(
        pool: &PgPool,
        patient_id: Option<DbId>,
        status_id: Option<StatusId>,
        params: &RequestListQuery,
    ) -> Result<Vec<EmergencyRequest>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);

        let status_id = status_id.or(params.status_id);

        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if patient_id.is_some() {
            conditions.push(format!("patient_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if status_id.is_some() {
            conditions.push(format!("status_id = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM emergency_requests \
             {where_clause} \
             ORDER BY created_at DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, EmergencyRequest>(&query);
        if let Some(pid) = patient_id {
            q = q.bind(pid);
        }
        if let Some(sid) = status_id {
            q = q.bind(sid);
        }
        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }

    /// Cancel a request.
    ///
    /// With `force` (administrator) any non-terminal status may be
    /// cancelled; without it only a live request may be. In the same
    /// transaction every still-open offer (pending or accepted) becomes
    /// rejected and the accepted-offer reference is cleared, so a
    /// cancelled request never points at an accepted offer.
    ///
    /// Cancelling an already-terminal request is an idempotent no-op.
    pub async fn cancel(
        pool: &PgPool,
        id: DbId,
        force: bool,
    ) -> Result<CancelOutcome, sqlx::Error> {
        let allowed: Vec<StatusId> = if force {
            vec![
                RequestStatus::Live.id(),
                RequestStatus::Accepted.id(),
                RequestStatus::InProgress.id(),
            ]
        } else {
            vec![RequestStatus::Live.id()]
        };

        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE emergency_requests \
             SET status_id = $2, cancelled_at = NOW(), \
                 accepted_offer_id = NULL, accepted_nurse_id = NULL \
             WHERE id = $1 AND status_id = ANY($3) \
             RETURNING {COLUMNS}"
        );
        let cancelled = sqlx::query_as::<_, EmergencyRequest>(&query)
            .bind(id)
            .bind(RequestStatus::Cancelled.id())
            .bind(&allowed)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(request) = cancelled {
            // No dangling open offers after cancellation.
            sqlx::query(
                "UPDATE nurse_offers SET status_id = $2 \
                 WHERE request_id = $1 AND status_id IN ($3, $4)",
            )
            .bind(id)
            .bind(OfferStatus::Rejected.id())
            .bind(OfferStatus::Pending.id())
            .bind(OfferStatus::Accepted.id())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            return Ok(CancelOutcome::Cancelled(request));
        }

        // The guard did not match; classify without writing anything.
        tx.rollback().await?;
        match Self::find_by_id(pool, id).await? {
            None => Ok(CancelOutcome::NotFound),
            Some(request) => {
                let terminal = request.status_id == RequestStatus::Completed.id()
                    || request.status_id == RequestStatus::Cancelled.id();
                if terminal {
                    Ok(CancelOutcome::AlreadyTerminal(request))
                } else {
                    Ok(CancelOutcome::NotCancellable(request))
                }
            }
        }
    }

    /// Mark an in-progress request as completed, stamping `completed_at`.
    ///
    /// This is the only path into `completed`.
    pub async fn complete(pool: &PgPool, id: DbId) -> Result<CompleteOutcome, sqlx::Error> {
        let query = format!(
            "UPDATE emergency_requests \
             SET status_id = $2, completed_at = NOW() \
             WHERE id = $1 AND status_id = $3 \
             RETURNING {COLUMNS}"
        );
        let completed = sqlx::query_as::<_, EmergencyRequest>(&query)
            .bind(id)
            .bind(RequestStatus::Completed.id())
            .bind(RequestStatus::InProgress.id())
            .fetch_optional(pool)
            .await?;

        if let Some(request) = completed {
            return Ok(CompleteOutcome::Completed(request));
        }

        match Self::find_by_id(pool, id).await? {
            None => Ok(CompleteOutcome::NotFound),
            Some(request) => Ok(CompleteOutcome::InvalidState(request)),
        }
    }

    /// Capture the one-time patient rating (with optional review and tip).
    ///
    /// The guard `patient_rating IS NULL` makes a second submission lose
    /// cleanly even when two arrive concurrently.
    pub async fn rate(
        pool: &PgPool,
        id: DbId,
        input: &SubmitRating,
    ) -> Result<RateOutcome, sqlx::Error> {
        let query = format!(
            "UPDATE emergency_requests \
             SET patient_rating = $2, patient_review = $3, tip_amount = $4 \
             WHERE id = $1 AND status_id = $5 AND patient_rating IS NULL \
             RETURNING {COLUMNS}"
        );
        let rated = sqlx::query_as::<_, EmergencyRequest>(&query)
            .bind(id)
            .bind(input.rating)
            .bind(&input.review)
            .bind(input.tip_amount)
            .bind(RequestStatus::Completed.id())
            .fetch_optional(pool)
            .await?;

        if let Some(request) = rated {
            return Ok(RateOutcome::Rated(request));
        }

        match Self::find_by_id(pool, id).await? {
            None => Ok(RateOutcome::NotFound),
            Some(request) if request.status_id != RequestStatus::Completed.id() => {
                Ok(RateOutcome::NotCompleted(request))
            }
            Some(request) => Ok(RateOutcome::AlreadyRated(request)),
        }
    }

    /// Attach administrative free-text notes without touching offers,
    /// status, or any invariant-bearing column.
    pub async fn set_admin_notes(
        pool: &PgPool,
        id: DbId,
        notes: &str,
    ) -> Result<Option<EmergencyRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE emergency_requests SET admin_notes = $2 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmergencyRequest>(&query)
            .bind(id)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    /// Cancel live requests older than `ttl_minutes` that hold no pending
    /// offers. Returns the ids of the requests that were expired.
    pub async fn expire_stale(
        pool: &PgPool,
        ttl_minutes: i64,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let expired: Vec<DbId> = sqlx::query_scalar(
            "UPDATE emergency_requests \
             SET status_id = $1, cancelled_at = NOW() \
             WHERE status_id = $2 \
               AND created_at < NOW() - ($3 * INTERVAL '1 minute') \
               AND NOT EXISTS ( \
                   SELECT 1 FROM nurse_offers \
                   WHERE request_id = emergency_requests.id AND status_id = $4 \
               ) \
             RETURNING id",
        )
        .bind(RequestStatus::Cancelled.id())
        .bind(RequestStatus::Live.id())
        .bind(ttl_minutes)
        .bind(OfferStatus::Pending.id())
        .fetch_all(pool)
        .await?;

        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), ttl_minutes, "Expired stale requests");
        }
        Ok(expired)
    }
}
