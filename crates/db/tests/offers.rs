//! Integration tests for offer submission, listing, and withdrawal.

use assert_matches::assert_matches;
use sqlx::PgPool;

use medidispatch_db::models::offer::CreateNurseOffer;
use medidispatch_db::models::request::CreateEmergencyRequest;
use medidispatch_db::models::status::OfferStatus;
use medidispatch_db::repositories::{
    AcceptOutcome, CancelOutcome, DispatchRepo, OfferRepo, RequestRepo, SubmitOutcome,
    WithdrawOutcome,
};

const PATIENT: i64 = 101;
const NURSE_A: i64 = 201;
const NURSE_B: i64 = 202;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_request() -> CreateEmergencyRequest {
    CreateEmergencyRequest {
        patient_name: "Noor A".to_string(),
        patient_phone: "+966500000004".to_string(),
        latitude: 24.4672,
        longitude: 39.6111,
        address: None,
        city: Some("Medina".to_string()),
        service_codes: vec!["wound_care".to_string()],
        urgency: "critical".to_string(),
        proposed_price: Some(250),
        notes: None,
    }
}

fn new_offer(price: i64) -> CreateNurseOffer {
    CreateNurseOffer {
        price,
        eta_minutes: 20,
        message: None,
        distance_km: Some(1.8),
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn test_submit_against_live_request(pool: PgPool) {
    let request = RequestRepo::create(&pool, PATIENT, &new_request())
        .await
        .unwrap();

    let outcome = OfferRepo::submit(&pool, request.id, NURSE_A, &new_offer(220))
        .await
        .unwrap();
    let offer = match outcome {
        SubmitOutcome::Created(offer) => offer,
        other => panic!("expected creation, got {other:?}"),
    };
    assert_eq!(offer.request_id, request.id);
    assert_eq!(offer.nurse_id, NURSE_A);
    assert_eq!(offer.price, 220);
    assert_eq!(offer.status_id, OfferStatus::Pending.id());
}

#[sqlx::test]
async fn test_submit_against_resolved_request_conflicts(pool: PgPool) {
    let request = RequestRepo::create(&pool, PATIENT, &new_request())
        .await
        .unwrap();
    assert_matches!(
        RequestRepo::cancel(&pool, request.id, false).await.unwrap(),
        CancelOutcome::Cancelled(_)
    );

    assert_matches!(
        OfferRepo::submit(&pool, request.id, NURSE_A, &new_offer(220))
            .await
            .unwrap(),
        SubmitOutcome::RequestNotLive
    );
}

#[sqlx::test]
async fn test_submit_after_acceptance_conflicts(pool: PgPool) {
    let request = RequestRepo::create(&pool, PATIENT, &new_request())
        .await
        .unwrap();
    let offer = match OfferRepo::submit(&pool, request.id, NURSE_A, &new_offer(220))
        .await
        .unwrap()
    {
        SubmitOutcome::Created(offer) => offer,
        other => panic!("offer submission failed: {other:?}"),
    };
    assert_matches!(
        DispatchRepo::accept_offer(&pool, request.id, offer.id)
            .await
            .unwrap(),
        AcceptOutcome::Accepted { .. }
    );

    // The submission reads the parent status under a share lock, so a
    // late bidder observes the acceptance and no pending offer can land
    // on the resolved request.
    assert_matches!(
        OfferRepo::submit(&pool, request.id, NURSE_B, &new_offer(180))
            .await
            .unwrap(),
        SubmitOutcome::RequestNotLive
    );
    let pending: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM nurse_offers WHERE request_id = $1 AND status_id = $2",
    )
    .bind(request.id)
    .bind(OfferStatus::Pending.id())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(pending, 0);
}

#[sqlx::test]
async fn test_submit_against_missing_request_not_found(pool: PgPool) {
    assert_matches!(
        OfferRepo::submit(&pool, 999_999, NURSE_A, &new_offer(220))
            .await
            .unwrap(),
        SubmitOutcome::RequestNotFound
    );
}

#[sqlx::test]
async fn test_second_pending_offer_from_same_nurse_violates_unique_index(pool: PgPool) {
    let request = RequestRepo::create(&pool, PATIENT, &new_request())
        .await
        .unwrap();
    OfferRepo::submit(&pool, request.id, NURSE_A, &new_offer(220))
        .await
        .unwrap();

    let err = OfferRepo::submit(&pool, request.id, NURSE_A, &new_offer(210))
        .await
        .expect_err("duplicate pending offer must be rejected");
    let db_err = err.as_database_error().expect("expected a database error");
    assert_eq!(
        db_err.constraint(),
        Some("uq_offers_one_pending_per_nurse")
    );

    // A withdrawn offer frees the slot for a re-bid.
    let offers = OfferRepo::list_by_request_for_nurse(&pool, request.id, NURSE_A)
        .await
        .unwrap();
    OfferRepo::withdraw(&pool, offers[0].id).await.unwrap();
    assert_matches!(
        OfferRepo::submit(&pool, request.id, NURSE_A, &new_offer(210))
            .await
            .unwrap(),
        SubmitOutcome::Created(_)
    );
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn test_list_scopes_by_nurse(pool: PgPool) {
    let request = RequestRepo::create(&pool, PATIENT, &new_request())
        .await
        .unwrap();
    OfferRepo::submit(&pool, request.id, NURSE_A, &new_offer(220))
        .await
        .unwrap();
    OfferRepo::submit(&pool, request.id, NURSE_B, &new_offer(240))
        .await
        .unwrap();

    let all = OfferRepo::list_by_request(&pool, request.id).await.unwrap();
    assert_eq!(all.len(), 2);

    let own = OfferRepo::list_by_request_for_nurse(&pool, request.id, NURSE_A)
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].nurse_id, NURSE_A);
}

// ---------------------------------------------------------------------------
// Withdrawal
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn test_withdraw_pending_offer(pool: PgPool) {
    let request = RequestRepo::create(&pool, PATIENT, &new_request())
        .await
        .unwrap();
    let offer = match OfferRepo::submit(&pool, request.id, NURSE_A, &new_offer(220))
        .await
        .unwrap()
    {
        SubmitOutcome::Created(offer) => offer,
        other => panic!("offer submission failed: {other:?}"),
    };

    let withdrawn = match OfferRepo::withdraw(&pool, offer.id).await.unwrap() {
        WithdrawOutcome::Withdrawn(offer) => offer,
        other => panic!("expected withdrawal, got {other:?}"),
    };
    assert_eq!(withdrawn.status_id, OfferStatus::Rejected.id());

    // A second withdrawal finds the offer no longer pending.
    assert_matches!(
        OfferRepo::withdraw(&pool, offer.id).await.unwrap(),
        WithdrawOutcome::NotPending(_)
    );
}

#[sqlx::test]
async fn test_withdraw_accepted_offer_conflicts(pool: PgPool) {
    let request = RequestRepo::create(&pool, PATIENT, &new_request())
        .await
        .unwrap();
    let offer = match OfferRepo::submit(&pool, request.id, NURSE_A, &new_offer(220))
        .await
        .unwrap()
    {
        SubmitOutcome::Created(offer) => offer,
        other => panic!("offer submission failed: {other:?}"),
    };
    assert_matches!(
        DispatchRepo::accept_offer(&pool, request.id, offer.id)
            .await
            .unwrap(),
        AcceptOutcome::Accepted { .. }
    );

    assert_matches!(
        OfferRepo::withdraw(&pool, offer.id).await.unwrap(),
        WithdrawOutcome::NotPending(_)
    );
}

#[sqlx::test]
async fn test_withdraw_missing_offer_not_found(pool: PgPool) {
    assert_matches!(
        OfferRepo::withdraw(&pool, 999_999).await.unwrap(),
        WithdrawOutcome::NotFound
    );
}
