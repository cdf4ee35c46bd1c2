//! Handlers for nurse offers: submission, listing, withdrawal, and the
//! single-winner acceptance.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use medidispatch_core::error::CoreError;
use medidispatch_core::offer::validate_new_offer;
use medidispatch_core::roles::ROLE_NURSE;
use medidispatch_core::types::DbId;
use medidispatch_db::models::offer::CreateNurseOffer;
use medidispatch_db::repositories::{
    AcceptOutcome, DispatchRepo, OfferRepo, SubmitOutcome, WithdrawOutcome,
};
use medidispatch_events::{
    DispatchEvent, EVENT_OFFER_ACCEPTED, EVENT_OFFER_SUBMITTED, EVENT_OFFER_WITHDRAWN,
};

use crate::error::{AppError, AppResult};
use crate::handlers::requests::{find_request, find_request_owned};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /requests/{id}/offers
///
/// Submit a competing offer against a live request. The insert itself is
/// guarded by the parent's status, so a submission racing an acceptance
/// loses cleanly with a 409.
pub async fn submit_offer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
    Json(input): Json<CreateNurseOffer>,
) -> AppResult<impl IntoResponse> {
    if auth.role != ROLE_NURSE {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only nurses may submit offers".into(),
        )));
    }

    validate_new_offer(input.price, input.eta_minutes)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let offer = match OfferRepo::submit(&state.pool, request_id, auth.user_id, &input).await? {
        SubmitOutcome::Created(offer) => offer,
        SubmitOutcome::RequestNotLive => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Request {request_id} is no longer accepting offers"
            ))));
        }
        SubmitOutcome::RequestNotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "EmergencyRequest",
                id: request_id,
            }));
        }
    };

    tracing::info!(
        request_id,
        offer_id = offer.id,
        user_id = auth.user_id,
        price = offer.price,
        eta_minutes = offer.eta_minutes,
        "Offer submitted"
    );
    state.event_bus.publish(
        DispatchEvent::new(EVENT_OFFER_SUBMITTED, request_id)
            .with_actor(auth.user_id)
            .with_payload(serde_json::json!({"offer_id": offer.id})),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: offer })))
}

/// GET /requests/{id}/offers
///
/// The owning patient and admins see every offer; a nurse sees only their
/// own offers on the request.
pub async fn list_offers(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = find_request(&state.pool, request_id).await?;

    let offers = if auth.is_admin() || request.patient_id == auth.user_id {
        OfferRepo::list_by_request(&state.pool, request_id).await?
    } else if auth.role == ROLE_NURSE {
        OfferRepo::list_by_request_for_nurse(&state.pool, request_id, auth.user_id).await?
    } else {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not your request".into(),
        )));
    };

    Ok(Json(DataResponse { data: offers }))
}

/// POST /requests/{id}/offers/{offer_id}/accept
///
/// Accept exactly one offer. Losing the race against a concurrent
/// acceptance, cancellation, or withdrawal is an expected 409, never a
/// partial write.
pub async fn accept_offer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((request_id, offer_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    find_request_owned(&state.pool, request_id, &auth).await?;

    let outcome = DispatchRepo::accept_offer(&state.pool, request_id, offer_id).await?;

    let (request, offer, tracking) = match outcome {
        AcceptOutcome::Accepted {
            request,
            offer,
            tracking,
        } => (request, offer, tracking),
        AcceptOutcome::RequestNotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "EmergencyRequest",
                id: request_id,
            }));
        }
        AcceptOutcome::OfferNotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "NurseOffer",
                id: offer_id,
            }));
        }
        AcceptOutcome::RequestNotLive(observed) => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Request {request_id} is no longer live (status {observed})"
            ))));
        }
        AcceptOutcome::OfferNotPending => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Offer {offer_id} is no longer pending"
            ))));
        }
    };

    tracing::info!(
        request_id,
        offer_id,
        nurse_id = offer.nurse_id,
        user_id = auth.user_id,
        "Offer accepted"
    );

    let event = DispatchEvent::new(EVENT_OFFER_ACCEPTED, request_id)
        .with_actor(auth.user_id)
        .with_payload(serde_json::json!({
            "offer_id": offer.id,
            "nurse_id": offer.nurse_id,
        }));
    state.alerter.alert(&event);
    state.event_bus.publish(event);

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "request": request,
            "offer": offer,
            "tracking": tracking,
        }),
    }))
}

/// POST /offers/{id}/withdraw
///
/// Only the offer's own nurse may retract a still-pending offer. Admins
/// have no withdrawal privilege; their lever is force-cancelling the
/// request, which rejects every open offer on it.
pub async fn withdraw_offer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(offer_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let offer = OfferRepo::find_by_id(&state.pool, offer_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "NurseOffer",
                id: offer_id,
            })
        })?;

    if offer.nurse_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not your offer".into(),
        )));
    }

    let offer = match OfferRepo::withdraw(&state.pool, offer_id).await? {
        WithdrawOutcome::Withdrawn(offer) => offer,
        WithdrawOutcome::NotPending(_) => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Offer {offer_id} is no longer pending"
            ))));
        }
        WithdrawOutcome::NotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "NurseOffer",
                id: offer_id,
            }));
        }
    };

    tracing::info!(
        offer_id,
        request_id = offer.request_id,
        user_id = auth.user_id,
        "Offer withdrawn"
    );
    state.event_bus.publish(
        DispatchEvent::new(EVENT_OFFER_WITHDRAWN, offer.request_id)
            .with_actor(auth.user_id)
            .with_payload(serde_json::json!({"offer_id": offer.id})),
    );

    Ok(Json(DataResponse { data: offer }))
}
