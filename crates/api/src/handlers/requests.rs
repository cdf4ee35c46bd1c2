//! Handlers for the emergency request lifecycle: creation, listing,
//! cancellation, completion, rating, and administrative annotation.
//!
//! Authorization is ownership-based, never role-alone: every mutation
//! re-checks the caller against the row it is about to touch.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use medidispatch_core::error::CoreError;
use medidispatch_core::rating::{validate_rating, validate_tip};
use medidispatch_core::request::validate_new_request;
use medidispatch_core::roles::{ROLE_NURSE, ROLE_PATIENT};
use medidispatch_core::types::DbId;
use medidispatch_db::models::request::{
    CreateEmergencyRequest, EmergencyRequest, RequestListQuery, SubmitRating,
};
use medidispatch_db::repositories::{
    CancelOutcome, CompleteOutcome, RateOutcome, RequestRepo,
};
use medidispatch_events::{
    DispatchEvent, EVENT_REQUEST_ANNOTATED, EVENT_REQUEST_CANCELLED, EVENT_REQUEST_COMPLETED,
    EVENT_REQUEST_CREATED, EVENT_REQUEST_RATED,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
   Shared lookups
   -------------------------------------------------------------------------- */

/// Load a request or produce a 404.
pub async fn find_request(
    pool: &medidispatch_db::DbPool,
    id: DbId,
) -> Result<EmergencyRequest, AppError> {
    RequestRepo::find_by_id(pool, id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "EmergencyRequest",
            id,
        })
    })
}

/// Load a request and verify the caller may mutate it as its patient.
///
/// Admins pass; anyone else must be the request's own patient.
pub async fn find_request_owned(
    pool: &medidispatch_db::DbPool,
    id: DbId,
    auth: &AuthUser,
) -> Result<EmergencyRequest, AppError> {
    let request = find_request(pool, id).await?;
    if !auth.is_admin() && request.patient_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not your request".into(),
        )));
    }
    Ok(request)
}

/* --------------------------------------------------------------------------
   DTOs
   -------------------------------------------------------------------------- */

/// Body for `PUT /requests/{id}/admin-notes`.
#[derive(Debug, Deserialize)]
pub struct AdminNotesBody {
    pub notes: String,
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// POST /requests
///
/// Create a live emergency request for the calling patient.
pub async fn create_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateEmergencyRequest>,
) -> AppResult<impl IntoResponse> {
    if auth.role != ROLE_PATIENT {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only patients may create requests".into(),
        )));
    }

    validate_new_request(
        input.latitude,
        input.longitude,
        &input.service_codes,
        &input.urgency,
        input.proposed_price,
    )
    .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let request = RequestRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(
        request_id = request.id,
        user_id = auth.user_id,
        urgency = %request.urgency,
        "Emergency request created"
    );

    let event = DispatchEvent::new(EVENT_REQUEST_CREATED, request.id)
        .with_actor(auth.user_id)
        .with_payload(serde_json::json!({"urgency": request.urgency}));
    state.alerter.alert(&event);
    state.event_bus.publish(event);

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// GET /requests
///
/// Role-scoped listing: patients see their own requests, nurses see the
/// live bidding pool, admins see everything (optionally filtered by
/// `?status_id`).
pub async fn list_requests(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<RequestListQuery>,
) -> AppResult<impl IntoResponse> {
    let requests = if auth.is_admin() {
        RequestRepo::list_all(&state.pool, &params).await?
    } else if auth.role == ROLE_NURSE {
        RequestRepo::list_live(&state.pool, &params).await?
    } else {
        RequestRepo::list_by_patient(&state.pool, auth.user_id, &params).await?
    };

    Ok(Json(DataResponse { data: requests }))
}

/// GET /requests/{id}
///
/// Visible to the owning patient, any nurse (they evaluate the live pool
/// and follow jobs they bid on), and admins.
pub async fn get_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = find_request(&state.pool, id).await?;

    let allowed = auth.is_admin()
        || auth.role == ROLE_NURSE
        || request.patient_id == auth.user_id;
    if !allowed {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not your request".into(),
        )));
    }

    Ok(Json(DataResponse { data: request }))
}

/// POST /requests/{id}/cancel
///
/// The owning patient may cancel only while the request is live; an admin
/// may force-cancel from any non-terminal state. Cancelling an
/// already-terminal request succeeds without changing anything.
pub async fn cancel_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_request_owned(&state.pool, id, &auth).await?;

    let outcome = RequestRepo::cancel(&state.pool, id, auth.is_admin()).await?;

    let request = match outcome {
        CancelOutcome::Cancelled(request) => {
            tracing::info!(request_id = id, user_id = auth.user_id, "Request cancelled");
            state.event_bus.publish(
                DispatchEvent::new(EVENT_REQUEST_CANCELLED, id).with_actor(auth.user_id),
            );
            request
        }
        CancelOutcome::AlreadyTerminal(request) => request,
        CancelOutcome::NotCancellable(request) => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Request {id} is already matched (status {}); only an administrator can cancel it",
                request.status_id
            ))));
        }
        CancelOutcome::NotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "EmergencyRequest",
                id,
            }));
        }
    };

    Ok(Json(DataResponse { data: request }))
}

/// POST /requests/{id}/complete
///
/// Explicit completion signal from the accepted nurse (or an admin) once
/// service is finished.
pub async fn complete_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = find_request(&state.pool, id).await?;

    if !auth.is_admin() && request.accepted_nurse_id != Some(auth.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the accepted nurse may complete this request".into(),
        )));
    }

    let request = match RequestRepo::complete(&state.pool, id).await? {
        CompleteOutcome::Completed(request) => request,
        CompleteOutcome::InvalidState(request) => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Request {id} is not in progress (status {})",
                request.status_id
            ))));
        }
        CompleteOutcome::NotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "EmergencyRequest",
                id,
            }));
        }
    };

    tracing::info!(request_id = id, user_id = auth.user_id, "Request completed");
    state
        .event_bus
        .publish(DispatchEvent::new(EVENT_REQUEST_COMPLETED, id).with_actor(auth.user_id));

    Ok(Json(DataResponse { data: request }))
}

/// POST /requests/{id}/rating
///
/// One-time rating by the owning patient after completion.
pub async fn rate_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SubmitRating>,
) -> AppResult<impl IntoResponse> {
    let request = find_request(&state.pool, id).await?;
    if request.patient_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the requesting patient may rate".into(),
        )));
    }

    validate_rating(input.rating).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    validate_tip(input.tip_amount).map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let request = match RequestRepo::rate(&state.pool, id, &input).await? {
        RateOutcome::Rated(request) => request,
        RateOutcome::AlreadyRated(_) => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Request {id} has already been rated"
            ))));
        }
        RateOutcome::NotCompleted(request) => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Request {id} is not completed yet (status {})",
                request.status_id
            ))));
        }
        RateOutcome::NotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "EmergencyRequest",
                id,
            }));
        }
    };

    tracing::info!(
        request_id = id,
        user_id = auth.user_id,
        rating = input.rating,
        "Request rated"
    );
    state
        .event_bus
        .publish(DispatchEvent::new(EVENT_REQUEST_RATED, id).with_actor(auth.user_id));

    Ok(Json(DataResponse { data: request }))
}

/// PUT /requests/{id}/admin-notes
///
/// Attach administrative free text. Touches nothing else.
pub async fn set_admin_notes(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<AdminNotesBody>,
) -> AppResult<impl IntoResponse> {
    if !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Administrator role required".into(),
        )));
    }

    let request = RequestRepo::set_admin_notes(&state.pool, id, &body.notes)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "EmergencyRequest",
                id,
            })
        })?;

    tracing::info!(request_id = id, user_id = auth.user_id, "Admin notes updated");
    state
        .event_bus
        .publish(DispatchEvent::new(EVENT_REQUEST_ANNOTATED, id).with_actor(auth.user_id));

    Ok(Json(DataResponse { data: request }))
}
