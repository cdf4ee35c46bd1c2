//! Handlers for delivery tracking: reading the nurse's progress and the
//! forward-only status advance.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use medidispatch_core::error::CoreError;
use medidispatch_core::geo::validate_coordinates;
use medidispatch_core::types::DbId;
use medidispatch_db::models::tracking::AdvanceTracking;
use medidispatch_db::repositories::{AdvanceOutcome, TrackingRepo};
use medidispatch_events::{DispatchEvent, EVENT_TRACKING_ADVANCED};

use crate::error::{AppError, AppResult};
use crate::handlers::requests::find_request;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /requests/{id}/tracking
///
/// Visible to the owning patient, the accepted nurse, and admins.
pub async fn get_tracking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = find_request(&state.pool, request_id).await?;

    let allowed = auth.is_admin()
        || request.patient_id == auth.user_id
        || request.accepted_nurse_id == Some(auth.user_id);
    if !allowed {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not your request".into(),
        )));
    }

    let tracking = TrackingRepo::find_by_request(&state.pool, request_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Tracking",
                id: request_id,
            })
        })?;

    Ok(Json(DataResponse { data: tracking }))
}

/// POST /requests/{id}/tracking/advance
///
/// The accepted nurse (or an admin) moves the tracking status forward.
/// A repeat of the current status is an accepted no-op that refreshes the
/// location; skipping ahead or regressing is a 409.
pub async fn advance_tracking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
    Json(input): Json<AdvanceTracking>,
) -> AppResult<impl IntoResponse> {
    let request = find_request(&state.pool, request_id).await?;

    if !auth.is_admin() && request.accepted_nurse_id != Some(auth.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the accepted nurse may report progress".into(),
        )));
    }

    if let (Some(lat), Some(lng)) = (input.latitude, input.longitude) {
        validate_coordinates(lat, lng).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    }

    let outcome = TrackingRepo::advance(&state.pool, request_id, &input).await?;

    let (tracking, notify) = match outcome {
        AdvanceOutcome::Advanced {
            tracking,
            request_started,
        } => {
            tracing::info!(
                request_id,
                status_id = tracking.status_id,
                request_started,
                user_id = auth.user_id,
                "Tracking advanced"
            );
            (tracking, true)
        }
        AdvanceOutcome::NoOp(tracking) => {
            // A repeated status still refreshes the location, and viewers
            // watching the nurse approach need to hear about that too.
            let location_updated = input.latitude.is_some() || input.longitude.is_some();
            (tracking, location_updated)
        }
        AdvanceOutcome::OutOfOrder { current, requested } => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Tracking status {requested} is not the successor of {current}"
            ))));
        }
        AdvanceOutcome::UnknownStatus(status_id) => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown tracking status {status_id}"
            ))));
        }
        AdvanceOutcome::NotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Tracking",
                id: request_id,
            }));
        }
    };

    if notify {
        state.event_bus.publish(
            DispatchEvent::new(EVENT_TRACKING_ADVANCED, request_id)
                .with_actor(auth.user_id)
                .with_payload(serde_json::json!({"status_id": tracking.status_id})),
        );
    }

    Ok(Json(DataResponse { data: tracking }))
}
