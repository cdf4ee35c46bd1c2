//! Repository for the `trackings` table — the forward-only progress of
//! the accepted nurse.
//!
//! Rows are created by the acceptance coordinator; this repo only reads
//! them and advances their status.

use medidispatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::status::{RequestStatus, StatusId, TrackingStatus};
use crate::models::tracking::{AdvanceTracking, Tracking};

/// Column list for `trackings` queries.
pub(crate) const COLUMNS: &str = "\
    id, request_id, nurse_id, status_id, latitude, longitude, \
    arrived_at, service_started_at, updated_at";

/// Result of a tracking advance attempt.
#[derive(Debug)]
pub enum AdvanceOutcome {
    /// The status moved to its immediate successor.
    Advanced {
        tracking: Tracking,
        /// True when this advance first reached `in_service` and the
        /// derived `accepted → in_progress` request transition fired.
        request_started: bool,
    },
    /// Idempotent repeat of the current status; location still updated.
    NoOp(Tracking),
    /// The requested status skips ahead or regresses.
    OutOfOrder {
        current: StatusId,
        requested: StatusId,
    },
    /// The requested status id is not a tracking status.
    UnknownStatus(StatusId),
    NotFound,
}

/// Provides lookup and the forward-only advance operation.
pub struct TrackingRepo;

impl TrackingRepo {
    /// Find the tracking row for a request.
    pub async fn find_by_request(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Option<Tracking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM trackings WHERE request_id = $1");
        sqlx::query_as::<_, Tracking>(&query)
            .bind(request_id)
            .fetch_optional(pool)
            .await
    }

    /// Advance the tracking status for a request.
    ///
    /// The row is locked for the duration of the transaction, so two
    /// concurrent advances serialize and the loser sees the winner's
    /// status. Rules:
    /// - a repeat of the current status is an accepted no-op;
    /// - only the immediate successor is a valid move (no skipping, no
    ///   regressing);
    /// - the first transition into `arrived` stamps `arrived_at` once, and
    ///   the first transition into `in_service` stamps
    ///   `service_started_at` once;
    /// - reaching `in_service` fires the derived `accepted → in_progress`
    ///   transition on the request in the same transaction, keeping a
    ///   single source of truth for "service is underway".
    pub async fn advance(
        pool: &PgPool,
        request_id: DbId,
        input: &AdvanceTracking,
    ) -> Result<AdvanceOutcome, sqlx::Error> {
        let Some(requested) = TrackingStatus::from_id(input.status_id) else {
            return Ok(AdvanceOutcome::UnknownStatus(input.status_id));
        };

        let mut tx = pool.begin().await?;

        let lock_query = format!("SELECT {COLUMNS} FROM trackings WHERE request_id = $1 FOR UPDATE");
        let current_row = sqlx::query_as::<_, Tracking>(&lock_query)
            .bind(request_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current_row) = current_row else {
            tx.rollback().await?;
            return Ok(AdvanceOutcome::NotFound);
        };

        // Status ids came from the seeded lookup table, so they always map.
        let current = TrackingStatus::from_id(current_row.status_id)
            .unwrap_or(TrackingStatus::EnRoute);

        if requested == current {
            // Idempotent repeat: refresh the location only.
            let query = format!(
                "UPDATE trackings \
                 SET latitude = COALESCE($2, latitude), \
                     longitude = COALESCE($3, longitude), \
                     updated_at = NOW() \
                 WHERE request_id = $1 \
                 RETURNING {COLUMNS}"
            );
            let tracking = sqlx::query_as::<_, Tracking>(&query)
                .bind(request_id)
                .bind(input.latitude)
                .bind(input.longitude)
                .fetch_one(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(AdvanceOutcome::NoOp(tracking));
        }

        if current.successor() != Some(requested) {
            tx.rollback().await?;
            return Ok(AdvanceOutcome::OutOfOrder {
                current: current.id(),
                requested: requested.id(),
            });
        }

        // COALESCE keeps the first stamp if the column is somehow already
        // set; the successor check above makes re-stamping unreachable.
        let query = format!(
            "UPDATE trackings \
             SET status_id = $2, \
                 latitude = COALESCE($3, latitude), \
                 longitude = COALESCE($4, longitude), \
                 arrived_at = CASE WHEN $2 = $5 THEN COALESCE(arrived_at, NOW()) ELSE arrived_at END, \
                 service_started_at = CASE WHEN $2 = $6 THEN COALESCE(service_started_at, NOW()) ELSE service_started_at END, \
                 updated_at = NOW() \
             WHERE request_id = $1 \
             RETURNING {COLUMNS}"
        );
        let tracking = sqlx::query_as::<_, Tracking>(&query)
            .bind(request_id)
            .bind(requested.id())
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(TrackingStatus::Arrived.id())
            .bind(TrackingStatus::InService.id())
            .fetch_one(&mut *tx)
            .await?;

        // Derived transition: service underway on the request itself.
        let mut request_started = false;
        if requested == TrackingStatus::InService {
            let result = sqlx::query(
                "UPDATE emergency_requests SET status_id = $2 \
                 WHERE id = $1 AND status_id = $3",
            )
            .bind(request_id)
            .bind(RequestStatus::InProgress.id())
            .bind(RequestStatus::Accepted.id())
            .execute(&mut *tx)
            .await?;
            request_started = result.rows_affected() > 0;
        }

        tx.commit().await?;

        Ok(AdvanceOutcome::Advanced {
            tracking,
            request_started,
        })
    }
}
