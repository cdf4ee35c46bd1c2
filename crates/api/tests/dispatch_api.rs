//! End-to-end HTTP tests for the dispatch flow: authentication, ownership
//! checks, the offer bidding flow, and the error envelope.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, error_code, get, get_as, post_as, send_json_as};
use medidispatch_core::roles::{ROLE_ADMIN, ROLE_NURSE, ROLE_PATIENT};
use medidispatch_events::EVENT_TRACKING_ADVANCED;
use sqlx::PgPool;
use tower::ServiceExt;

const PATIENT: i64 = 101;
const OTHER_PATIENT: i64 = 102;
const NURSE: i64 = 201;

fn request_body() -> serde_json::Value {
    serde_json::json!({
        "patient_name": "Amal K",
        "patient_phone": "+966500000001",
        "latitude": 24.7136,
        "longitude": 46.6753,
        "city": "Riyadh",
        "service_codes": ["wound_care"],
        "urgency": "critical",
        "proposed_price": 300,
    })
}

fn offer_body() -> serde_json::Value {
    serde_json::json!({
        "price": 250,
        "eta_minutes": 25,
        "message": "Can be there soon",
    })
}

/// Create a request over HTTP and return its id.
async fn create_request(app: &axum::Router) -> i64 {
    let response = send_json_as(
        app.clone(),
        "POST",
        "/api/v1/requests",
        PATIENT,
        ROLE_PATIENT,
        request_body(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_i64().expect("created request id")
}

/// Submit an offer over HTTP and return its id.
async fn submit_offer(app: &axum::Router, request_id: i64) -> i64 {
    let response = send_json_as(
        app.clone(),
        "POST",
        &format!("/api/v1/requests/{request_id}/offers"),
        NURSE,
        ROLE_NURSE,
        offer_body(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_i64().expect("created offer id")
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/requests").await;

    let code = error_code(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(code, "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn garbage_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request = Request::builder()
        .uri("/api/v1/requests")
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Creation and role scoping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn nurse_cannot_create_request(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = send_json_as(
        app,
        "POST",
        "/api/v1/requests",
        NURSE,
        ROLE_NURSE,
        request_body(),
    )
    .await;

    let code = error_code(response, StatusCode::FORBIDDEN).await;
    assert_eq!(code, "FORBIDDEN");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_coordinates_are_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let mut body = request_body();
    body["latitude"] = serde_json::json!(95.0);

    let response =
        send_json_as(app, "POST", "/api/v1/requests", PATIENT, ROLE_PATIENT, body).await;

    let code = error_code(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(code, "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn listing_is_role_scoped(pool: PgPool) {
    let app = common::build_test_app(pool);
    let id = create_request(&app).await;

    // The owner sees their request.
    let response = get_as(app.clone(), "/api/v1/requests", PATIENT, ROLE_PATIENT).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    // Another patient sees nothing.
    let response = get_as(app.clone(), "/api/v1/requests", OTHER_PATIENT, ROLE_PATIENT).await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    // A nurse sees the live pool.
    let response = get_as(app.clone(), "/api/v1/requests", NURSE, ROLE_NURSE).await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"].as_i64(), Some(id));
}

// ---------------------------------------------------------------------------
// Acceptance flow over HTTP
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn full_bidding_flow(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request_id = create_request(&app).await;
    let offer_id = submit_offer(&app, request_id).await;

    // Only the owning patient (or an admin) may accept.
    let uri = format!("/api/v1/requests/{request_id}/offers/{offer_id}/accept");
    let response = post_as(app.clone(), &uri, OTHER_PATIENT, ROLE_PATIENT).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_as(app.clone(), &uri, PATIENT, ROLE_PATIENT).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["request"]["accepted_offer_id"].as_i64(), Some(offer_id));
    assert_eq!(json["data"]["tracking"]["status_id"].as_i64(), Some(1));

    // A second accept observes the resolved request.
    let response = post_as(app.clone(), &uri, PATIENT, ROLE_PATIENT).await;
    let code = error_code(response, StatusCode::CONFLICT).await;
    assert_eq!(code, "CONFLICT");

    // Late offers bounce off the resolved request.
    let response = send_json_as(
        app.clone(),
        "POST",
        &format!("/api/v1/requests/{request_id}/offers"),
        NURSE,
        ROLE_NURSE,
        offer_body(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The accepted nurse reads the tracking row; a stranger cannot.
    let tracking_uri = format!("/api/v1/requests/{request_id}/tracking");
    let response = get_as(app.clone(), &tracking_uri, NURSE, ROLE_NURSE).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_as(app.clone(), &tracking_uri, OTHER_PATIENT, ROLE_PATIENT).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_pending_offer_maps_to_conflict(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request_id = create_request(&app).await;
    submit_offer(&app, request_id).await;

    // The partial unique index surfaces as a 409, not a 500.
    let response = send_json_as(
        app,
        "POST",
        &format!("/api/v1/requests/{request_id}/offers"),
        NURSE,
        ROLE_NURSE,
        offer_body(),
    )
    .await;
    let code = error_code(response, StatusCode::CONFLICT).await;
    assert_eq!(code, "CONFLICT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn only_the_owning_nurse_may_withdraw(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request_id = create_request(&app).await;
    let offer_id = submit_offer(&app, request_id).await;
    let uri = format!("/api/v1/offers/{offer_id}/withdraw");

    // Admins act on the request via force-cancel, never on a nurse's offer.
    let response = post_as(app.clone(), &uri, 1, ROLE_ADMIN).await;
    let code = error_code(response, StatusCode::FORBIDDEN).await;
    assert_eq!(code, "FORBIDDEN");

    let response = post_as(app.clone(), &uri, NURSE, ROLE_NURSE).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Tracking signals
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn location_refresh_on_repeated_status_publishes_signal(pool: PgPool) {
    let (app, bus) = common::build_test_app_with_bus(pool);
    let request_id = create_request(&app).await;
    let offer_id = submit_offer(&app, request_id).await;

    let uri = format!("/api/v1/requests/{request_id}/offers/{offer_id}/accept");
    let response = post_as(app.clone(), &uri, PATIENT, ROLE_PATIENT).await;
    assert_eq!(response.status(), StatusCode::OK);

    let advance_uri = format!("/api/v1/requests/{request_id}/tracking/advance");
    let mut rx = bus.subscribe();

    // Repeating en_route with fresh coordinates leaves the status alone
    // but still tells watchers the nurse moved.
    let response = send_json_as(
        app.clone(),
        "POST",
        &advance_uri,
        NURSE,
        ROLE_NURSE,
        serde_json::json!({"status_id": 1, "latitude": 24.71, "longitude": 46.68}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let event = rx
        .try_recv()
        .expect("location refresh should publish a signal");
    assert_eq!(event.event_type, EVENT_TRACKING_ADVANCED);
    assert_eq!(event.request_id, request_id);

    // A bare repeat with no coordinates changes nothing and stays silent.
    let response = send_json_as(
        app.clone(),
        "POST",
        &advance_uri,
        NURSE,
        ROLE_NURSE,
        serde_json::json!({"status_id": 1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(rx.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Administrative endpoints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_notes_require_admin_role(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request_id = create_request(&app).await;
    let uri = format!("/api/v1/requests/{request_id}/admin-notes");
    let body = serde_json::json!({"notes": "follow up with the family"});

    let response =
        send_json_as(app.clone(), "PUT", &uri, PATIENT, ROLE_PATIENT, body.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send_json_as(app.clone(), "PUT", &uri, 1, ROLE_ADMIN, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["data"]["admin_notes"].as_str(),
        Some("follow up with the family")
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_request_is_not_found(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_as(app, "/api/v1/requests/999999", PATIENT, ROLE_PATIENT).await;

    let code = error_code(response, StatusCode::NOT_FOUND).await;
    assert_eq!(code, "NOT_FOUND");
}
