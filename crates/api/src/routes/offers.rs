//! Route definitions for offer-scoped operations outside the request tree.

use axum::routing::post;
use axum::Router;

use crate::handlers::offers;
use crate::state::AppState;

/// Offer-scoped routes, nested under `/offers`.
///
/// ```text
/// POST   /{id}/withdraw                     withdraw_offer
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/withdraw", post(offers::withdraw_offer))
}
