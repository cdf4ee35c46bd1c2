pub mod health;
pub mod offers;
pub mod requests;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                       WebSocket upgrade
///
/// /requests                                 create, list
/// /requests/{id}                            get
/// /requests/{id}/cancel                     cancel
/// /requests/{id}/complete                   complete
/// /requests/{id}/rating                     rate
/// /requests/{id}/admin-notes                annotate (admin)
/// /requests/{id}/offers                     list, submit
/// /requests/{id}/offers/{offer_id}/accept   accept
/// /requests/{id}/tracking                   get
/// /requests/{id}/tracking/advance           advance
///
/// /offers/{id}/withdraw                     withdraw
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/requests", requests::router())
        .nest("/offers", offers::router())
}
