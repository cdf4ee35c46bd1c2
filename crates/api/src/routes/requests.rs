//! Route definitions for the emergency request lifecycle, including the
//! nested offer and tracking endpoints.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{offers, requests, tracking};
use crate::state::AppState;

/// Request-scoped routes, nested under `/requests`.
///
/// ```text
/// POST   /                                  create_request
/// GET    /                                  list_requests (?status_id, ?limit, ?offset)
/// GET    /{id}                              get_request
/// POST   /{id}/cancel                       cancel_request
/// POST   /{id}/complete                     complete_request
/// POST   /{id}/rating                       rate_request
/// PUT    /{id}/admin-notes                  set_admin_notes
/// GET    /{id}/offers                       list_offers
/// POST   /{id}/offers                       submit_offer
/// POST   /{id}/offers/{offer_id}/accept     accept_offer
/// GET    /{id}/tracking                     get_tracking
/// POST   /{id}/tracking/advance             advance_tracking
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(requests::create_request).get(requests::list_requests),
        )
        .route("/{id}", get(requests::get_request))
        .route("/{id}/cancel", post(requests::cancel_request))
        .route("/{id}/complete", post(requests::complete_request))
        .route("/{id}/rating", post(requests::rate_request))
        .route("/{id}/admin-notes", put(requests::set_admin_notes))
        .route(
            "/{id}/offers",
            get(offers::list_offers).post(offers::submit_offer),
        )
        .route(
            "/{id}/offers/{offer_id}/accept",
            post(offers::accept_offer),
        )
        .route("/{id}/tracking", get(tracking::get_tracking))
        .route("/{id}/tracking/advance", post(tracking::advance_tracking))
}
