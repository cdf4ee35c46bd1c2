//! The acceptance coordinator: the live→accepted transition.
//!
//! Accepting an offer is the only operation where multiple independent
//! actors race for the same transition, so the whole write set — winning
//! offer accepted, every sibling pending offer rejected, request accepted
//! with its references populated, tracking row created — commits as one
//! transaction guarded by a compare-and-swap on the request's status.
//! Losing the race is an expected outcome, reported as
//! [`AcceptOutcome::RequestNotLive`], never a partial write.

use medidispatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::offer::NurseOffer;
use crate::models::request::EmergencyRequest;
use crate::models::status::{OfferStatus, RequestStatus, StatusId, TrackingStatus};
use crate::models::tracking::Tracking;
use crate::repositories::{offer_repo, request_repo, tracking_repo};

/// Result of an acceptance attempt.
#[derive(Debug)]
pub enum AcceptOutcome {
    /// The caller won: all four writes committed atomically.
    Accepted {
        request: EmergencyRequest,
        offer: NurseOffer,
        tracking: Tracking,
    },
    RequestNotFound,
    /// The offer does not exist or does not belong to this request.
    OfferNotFound,
    /// The status guard failed: a concurrent acceptance, cancellation, or
    /// completion got there first. Carries the status that was observed.
    RequestNotLive(StatusId),
    /// The offer exists but is no longer pending (withdrawn or already
    /// resolved by an earlier acceptance).
    OfferNotPending,
}

/// Coordinates the atomic acceptance of a single winning offer.
pub struct DispatchRepo;

impl DispatchRepo {
    /// Atomically accept `offer_id` on `request_id`.
    ///
    /// Inside one transaction:
    /// 1. load the offer and verify it belongs to the request;
    /// 2. CAS the request `live → accepted`, populating
    ///    `accepted_offer_id` / `accepted_nurse_id` — zero rows means the
    ///    race was lost and the transaction aborts with no side effects;
    /// 3. flip the chosen offer `pending → accepted` (guarded);
    /// 4. reject every sibling pending offer;
    /// 5. insert the tracking row with status `en_route`.
    ///
    /// Callers are responsible for authorization (request owner or admin).
    pub async fn accept_offer(
        pool: &PgPool,
        request_id: DbId,
        offer_id: DbId,
    ) -> Result<AcceptOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // 1. The offer must exist and belong to this request.
        let offer_query = format!(
            "SELECT {} FROM nurse_offers WHERE id = $1 AND request_id = $2",
            offer_repo::COLUMNS
        );
        let offer = sqlx::query_as::<_, NurseOffer>(&offer_query)
            .bind(offer_id)
            .bind(request_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(offer) = offer else {
            tx.rollback().await?;
            return Ok(AcceptOutcome::OfferNotFound);
        };

        // 2. Compare-and-swap on the request status. This is the guard
        // that serializes concurrent acceptances: exactly one caller sees
        // `live` here.
        let request_query = format!(
            "UPDATE emergency_requests \
             SET status_id = $2, accepted_offer_id = $3, accepted_nurse_id = $4 \
             WHERE id = $1 AND status_id = $5 \
             RETURNING {}",
            request_repo::COLUMNS
        );
        let request = sqlx::query_as::<_, EmergencyRequest>(&request_query)
            .bind(request_id)
            .bind(RequestStatus::Accepted.id())
            .bind(offer_id)
            .bind(offer.nurse_id)
            .bind(RequestStatus::Live.id())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(request) = request else {
            tx.rollback().await?;
            let status: Option<StatusId> =
                sqlx::query_scalar("SELECT status_id FROM emergency_requests WHERE id = $1")
                    .bind(request_id)
                    .fetch_optional(pool)
                    .await?;
            return Ok(match status {
                None => AcceptOutcome::RequestNotFound,
                Some(observed) => AcceptOutcome::RequestNotLive(observed),
            });
        };

        // 3. The chosen offer must still be pending (it may have been
        // withdrawn between the read above and now).
        let accept_query = format!(
            "UPDATE nurse_offers SET status_id = $2 \
             WHERE id = $1 AND status_id = $3 \
             RETURNING {}",
            offer_repo::COLUMNS
        );
        let accepted = sqlx::query_as::<_, NurseOffer>(&accept_query)
            .bind(offer_id)
            .bind(OfferStatus::Accepted.id())
            .bind(OfferStatus::Pending.id())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(offer) = accepted else {
            tx.rollback().await?;
            return Ok(AcceptOutcome::OfferNotPending);
        };

        // 4. Every sibling pending offer loses in the same commit.
        sqlx::query(
            "UPDATE nurse_offers SET status_id = $2 \
             WHERE request_id = $1 AND status_id = $3 AND id <> $4",
        )
        .bind(request_id)
        .bind(OfferStatus::Rejected.id())
        .bind(OfferStatus::Pending.id())
        .bind(offer_id)
        .execute(&mut *tx)
        .await?;

        // 5. Tracking starts at en_route, atomically with acceptance.
        let tracking_query = format!(
            "INSERT INTO trackings (request_id, nurse_id, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING {}",
            tracking_repo::COLUMNS
        );
        let tracking = sqlx::query_as::<_, Tracking>(&tracking_query)
            .bind(request_id)
            .bind(offer.nurse_id)
            .bind(TrackingStatus::EnRoute.id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(AcceptOutcome::Accepted {
            request,
            offer,
            tracking,
        })
    }
}
