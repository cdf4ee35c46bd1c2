//! Repository for the `nurse_offers` table.
//!
//! Offers are append-only: created while the parent request is live,
//! mutated only by the acceptance coordinator, by cancellation, or by the
//! owning nurse's withdrawal while still pending. Never deleted.

use medidispatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::offer::{CreateNurseOffer, NurseOffer};
use crate::models::status::{OfferStatus, RequestStatus, StatusId};

/// Column list for `nurse_offers` queries.
pub(crate) const COLUMNS: &str = "\
    id, request_id, nurse_id, price, eta_minutes, message, distance_km, \
    status_id, created_at";

/// Result of an offer submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    Created(NurseOffer),
    /// The parent request exists but is no longer live.
    RequestNotLive,
    RequestNotFound,
}

/// Result of a withdrawal attempt.
#[derive(Debug)]
pub enum WithdrawOutcome {
    Withdrawn(NurseOffer),
    /// The offer has already been accepted or rejected.
    NotPending(NurseOffer),
    NotFound,
}

/// Provides submission, withdrawal, and lookup operations for offers.
pub struct OfferRepo;

impl OfferRepo {
    /// Submit an offer against a live request.
    ///
    /// The parent row is share-locked for the duration of the transaction,
    /// so a submission racing an acceptance (whose `UPDATE` takes an
    /// exclusive row lock) serializes against it: whichever commits second
    /// sees the other's status. Without the lock, a snapshot taken just
    /// before the acceptance committed could insert a pending offer onto
    /// an already-resolved request, stranding it forever.
    ///
    /// A second pending offer from the same nurse on the same request
    /// violates `uq_offers_one_pending_per_nurse` and surfaces as a
    /// unique-constraint error the API layer maps to 409.
    pub async fn submit(
        pool: &PgPool,
        request_id: DbId,
        nurse_id: DbId,
        input: &CreateNurseOffer,
    ) -> Result<SubmitOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let status_id: Option<StatusId> = sqlx::query_scalar(
            "SELECT status_id FROM emergency_requests WHERE id = $1 FOR SHARE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(status_id) = status_id else {
            tx.rollback().await?;
            return Ok(SubmitOutcome::RequestNotFound);
        };
        if status_id != RequestStatus::Live.id() {
            tx.rollback().await?;
            return Ok(SubmitOutcome::RequestNotLive);
        }

        let query = format!(
            "INSERT INTO nurse_offers \
                (request_id, nurse_id, price, eta_minutes, message, distance_km, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let offer = sqlx::query_as::<_, NurseOffer>(&query)
            .bind(request_id)
            .bind(nurse_id)
            .bind(input.price)
            .bind(input.eta_minutes)
            .bind(&input.message)
            .bind(input.distance_km)
            .bind(OfferStatus::Pending.id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(SubmitOutcome::Created(offer))
    }

    /// Withdraw a pending offer. The offer becomes rejected; there is no
    /// separate withdrawn status.
    ///
    /// Ownership is the caller's concern; the status guard here makes a
    /// withdrawal racing an acceptance lose cleanly.
    pub async fn withdraw(pool: &PgPool, id: DbId) -> Result<WithdrawOutcome, sqlx::Error> {
        let query = format!(
            "UPDATE nurse_offers SET status_id = $2 \
             WHERE id = $1 AND status_id = $3 \
             RETURNING {COLUMNS}"
        );
        let withdrawn = sqlx::query_as::<_, NurseOffer>(&query)
            .bind(id)
            .bind(OfferStatus::Rejected.id())
            .bind(OfferStatus::Pending.id())
            .fetch_optional(pool)
            .await?;

        if let Some(offer) = withdrawn {
            return Ok(WithdrawOutcome::Withdrawn(offer));
        }

        match Self::find_by_id(pool, id).await? {
            None => Ok(WithdrawOutcome::NotFound),
            Some(offer) => Ok(WithdrawOutcome::NotPending(offer)),
        }
    }

    /// Find an offer by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<NurseOffer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM nurse_offers WHERE id = $1");
        sqlx::query_as::<_, NurseOffer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every offer belonging to a request, newest first.
    pub async fn list_by_request(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<NurseOffer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM nurse_offers \
             WHERE request_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, NurseOffer>(&query)
            .bind(request_id)
            .fetch_all(pool)
            .await
    }

    /// List a single nurse's offers on a request.
    pub async fn list_by_request_for_nurse(
        pool: &PgPool,
        request_id: DbId,
        nurse_id: DbId,
    ) -> Result<Vec<NurseOffer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM nurse_offers \
             WHERE request_id = $1 AND nurse_id = $2 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, NurseOffer>(&query)
            .bind(request_id)
            .bind(nurse_id)
            .fetch_all(pool)
            .await
    }
}
