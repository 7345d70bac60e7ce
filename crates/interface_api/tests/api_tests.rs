//! HTTP tests for the claims API

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde_json::{json, Value};

use core_kernel::{ClaimId, MemoryKeyValueStore, RecordingNotifier, Timezone, UserId};
use domain_claims::Claim;
use domain_messaging::Conversation;
use domain_scheduling::{AppointmentType, BodyShopSchedule, BookingRequest, DaySchedule};
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};

fn test_server() -> (TestServer, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let state = AppState::new(
        ApiConfig::for_tests(),
        Arc::new(MemoryKeyValueStore::new()),
        notifier.clone(),
    );
    let server = TestServer::new(create_router(state)).unwrap();
    (server, notifier)
}

/// Server plus the state behind it, for tests that reach past the API
fn test_app() -> (TestServer, AppState) {
    let state = AppState::new(
        ApiConfig::for_tests(),
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(RecordingNotifier::new()),
    );
    let server = TestServer::new(create_router(state.clone())).unwrap();
    (server, state)
}

async fn login(server: &TestServer, role: &str, name: &str) -> (String, UserId) {
    let response = server
        .post("/auth/token")
        .json(&json!({ "role": role, "name": name }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let token = body["token"].as_str().unwrap().to_string();
    let id: UserId = serde_json::from_value(body["user"]["id"].clone()).unwrap();
    (token, id)
}

async fn claim_with_photos(server: &TestServer, token: &str) -> Claim {
    let claim: Claim = server.post("/api/v1/claims").authorization_bearer(token).await.json();

    server
        .put(&format!("/api/v1/claims/{}/vehicle", claim.id.as_uuid()))
        .authorization_bearer(token)
        .json(&json!({ "year": 2021, "make": "Toyota", "model": "Camry" }))
        .await
        .assert_status_ok();

    server
        .post(&format!("/api/v1/claims/{}/photos", claim.id.as_uuid()))
        .authorization_bearer(token)
        .json(&json!({ "photos": [
            { "uri": "file:///front.jpg", "angle": "front" },
            { "uri": "file:///corner.jpg", "angle": "front_driver_corner" }
        ]}))
        .await
        .json()
}

fn claim_path(id: ClaimId, suffix: &str) -> String {
    format!("/api/v1/claims/{}{}", id.as_uuid(), suffix)
}

fn next_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(7);
    while date.weekday() != Weekday::Mon {
        date += Duration::days(1);
    }
    date
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let (server, _) = test_server();
        server.get("/health").await.assert_status_ok();
        server.get("/health/ready").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let (server, _) = test_server();
        server.get("/api/v1/claims").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/v1/claims")
            .authorization_bearer("not-a-token")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (server, _) = test_server();
        server
            .post("/auth/token")
            .json(&json!({ "role": "customer", "name": "" }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

mod claim_tests {
    use super::*;

    #[tokio::test]
    async fn test_intake_analysis_estimate_and_review() {
        let (server, notifier) = test_server();
        let (shop, _) = login(&server, "body_shop", "Main Street Collision").await;
        let (adjuster, _) = login(&server, "adjuster", "Sam Reyes").await;

        let claim = claim_with_photos(&server, &shop).await;
        assert_eq!(claim.photos.len(), 2);

        let active: Claim = server
            .get("/api/v1/claims/active")
            .authorization_bearer(&shop)
            .await
            .json();
        assert_eq!(active.id, claim.id);

        let analysis: Value = server
            .post(&claim_path(claim.id, "/analyze"))
            .authorization_bearer(&shop)
            .await
            .json();
        assert_eq!(analysis["claim"]["status"], "pending_review");
        assert!(analysis["pre_estimate"].is_object());

        let estimate = server
            .post(&claim_path(claim.id, "/estimate"))
            .authorization_bearer(&shop)
            .json(&json!({ "format": "mitchell" }))
            .await;
        estimate.assert_status_ok();
        let estimate: Value = estimate.json();
        assert!(estimate["formatted"].as_str().unwrap().contains("MITCHELL"));

        let text = server
            .get(&claim_path(claim.id, "/estimate"))
            .add_query_param("format", "ccc_one")
            .authorization_bearer(&shop)
            .await
            .text();
        assert!(text.contains("Toyota"));

        let options: Value = server
            .get(&claim_path(claim.id, "/estimate/options"))
            .authorization_bearer(&shop)
            .await
            .json();
        assert_eq!(options["options"].as_array().unwrap().len(), 3);
        assert!(options["savings_percent"].as_i64().unwrap() >= 0);

        let pending: Vec<Claim> = server
            .get("/api/v1/claims/pending")
            .authorization_bearer(&adjuster)
            .await
            .json();
        assert_eq!(pending.len(), 1);

        let reviewed: Claim = server
            .post(&claim_path(claim.id, "/review"))
            .authorization_bearer(&adjuster)
            .json(&json!({ "decision": "approve", "fraud_score": 12 }))
            .await
            .json();
        assert_eq!(reviewed.fraud_score, Some(12));

        let timeline: Value = server
            .get(&claim_path(claim.id, "/timeline"))
            .authorization_bearer(&shop)
            .await
            .json();
        assert!(timeline["eta"].is_string());

        let titles: Vec<String> = notifier.sent().await.into_iter().map(|n| n.title).collect();
        assert!(titles.iter().any(|t| t == "Claim Approved"));
    }

    #[tokio::test]
    async fn test_only_adjusters_review() {
        let (server, _) = test_server();
        let (shop, _) = login(&server, "body_shop", "Shop").await;
        let claim = claim_with_photos(&server, &shop).await;

        server
            .post(&claim_path(claim.id, "/review"))
            .authorization_bearer(&shop)
            .json(&json!({ "decision": "approve" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_review_of_draft_conflicts() {
        let (server, _) = test_server();
        let (shop, _) = login(&server, "body_shop", "Shop").await;
        let (adjuster, _) = login(&server, "adjuster", "Adjuster").await;
        let claim = claim_with_photos(&server, &shop).await;

        let response = server
            .post(&claim_path(claim.id, "/review"))
            .authorization_bearer(&adjuster)
            .json(&json!({ "decision": "reject", "reason": "duplicate", "fraud_score": 80 }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_analyze_without_photos_is_rejected() {
        let (server, _) = test_server();
        let (shop, _) = login(&server, "body_shop", "Shop").await;
        let claim: Claim = server.post("/api/v1/claims").authorization_bearer(&shop).await.json();

        server
            .post(&claim_path(claim.id, "/analyze"))
            .authorization_bearer(&shop)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_other_shops_cannot_see_claim() {
        let (server, _) = test_server();
        let (shop, _) = login(&server, "body_shop", "Shop A").await;
        let (other, _) = login(&server, "body_shop", "Shop B").await;
        let claim: Claim = server.post("/api/v1/claims").authorization_bearer(&shop).await.json();

        server
            .get(&claim_path(claim.id, ""))
            .authorization_bearer(&other)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let listed: Vec<Claim> = server.get("/api/v1/claims").authorization_bearer(&other).await.json();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_claim_is_not_found() {
        let (server, _) = test_server();
        let (shop, _) = login(&server, "body_shop", "Shop").await;
        server
            .get(&claim_path(ClaimId::new(), ""))
            .authorization_bearer(&shop)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_new_claim_opens_its_conversation() {
        let (server, _) = test_server();
        let (customer, customer_id) = login(&server, "customer", "Pat").await;
        let claim: Claim = server.post("/api/v1/claims").authorization_bearer(&customer).await.json();

        let conversations: Vec<Conversation> = server
            .get("/api/v1/conversations")
            .authorization_bearer(&customer)
            .await
            .json();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].claim_id, claim.id);
        assert_eq!(conversations[0].participants, vec![customer_id]);
    }

    #[tokio::test]
    async fn test_expired_estimate_is_not_rendered() {
        let (server, state) = test_app();
        let (shop, _) = login(&server, "body_shop", "Shop").await;
        let claim = claim_with_photos(&server, &shop).await;

        server
            .post(&claim_path(claim.id, "/analyze"))
            .authorization_bearer(&shop)
            .await
            .assert_status_ok();
        server
            .post(&claim_path(claim.id, "/estimate"))
            .authorization_bearer(&shop)
            .await
            .assert_status_ok();
        server
            .get(&claim_path(claim.id, "/estimate"))
            .authorization_bearer(&shop)
            .await
            .assert_status_ok();

        let mut estimate = state.claims.get_claim(claim.id).await.unwrap().estimate.unwrap();
        estimate.expires_at = Utc::now() - Duration::days(1);
        state.claims.set_estimate(claim.id, estimate).await.unwrap();

        let response = server
            .get(&claim_path(claim.id, "/estimate"))
            .authorization_bearer(&shop)
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "conflict");
    }
}

mod insurance_tests {
    use super::*;

    #[tokio::test]
    async fn test_locked_insurance_rejects_edits() {
        let (server, _) = test_server();
        let (shop, _) = login(&server, "body_shop", "Shop").await;
        let (adjuster, _) = login(&server, "adjuster", "Adjuster").await;
        let claim = claim_with_photos(&server, &shop).await;

        let status: Value = server
            .put(&claim_path(claim.id, "/insurance"))
            .authorization_bearer(&shop)
            .json(&json!({ "provider": "Geico", "policy_number": "GC-1234" }))
            .await
            .json();
        assert_eq!(status["status"], "partial");

        server
            .post(&claim_path(claim.id, "/analyze"))
            .authorization_bearer(&shop)
            .await
            .assert_status_ok();

        let locked: Value = server
            .post(&claim_path(claim.id, "/insurance/lock"))
            .authorization_bearer(&adjuster)
            .await
            .json();
        assert_eq!(locked["locked"], true);

        let response = server
            .put(&claim_path(claim.id, "/insurance"))
            .authorization_bearer(&shop)
            .json(&json!({ "provider": "Geico", "policy_number": "GC-1234", "agent_name": "Dana" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "locked");
    }

    #[tokio::test]
    async fn test_body_shop_submission_locks_insurance() {
        let (server, _) = test_server();
        let (shop, _) = login(&server, "body_shop", "Shop").await;
        let claim = claim_with_photos(&server, &shop).await;

        server
            .put(&claim_path(claim.id, "/insurance"))
            .authorization_bearer(&shop)
            .json(&json!({ "provider": "Geico", "policy_number": "GC-1234" }))
            .await
            .assert_status_ok();

        let submitted: Claim = server
            .post(&claim_path(claim.id, "/submit"))
            .authorization_bearer(&shop)
            .await
            .json();
        assert!(submitted.is_insurance_locked());

        let response = server
            .put(&claim_path(claim.id, "/insurance"))
            .authorization_bearer(&shop)
            .json(&json!({ "provider": "Geico", "policy_number": "GC-1234", "agent_name": "Dana" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "locked");
    }

    #[tokio::test]
    async fn test_lock_allowed_for_shop_not_customer() {
        let (server, _) = test_server();
        let (shop, _) = login(&server, "body_shop", "Shop").await;
        let (customer, _) = login(&server, "customer", "Pat").await;
        let shop_claim: Claim = server.post("/api/v1/claims").authorization_bearer(&shop).await.json();
        let own_claim: Claim = server.post("/api/v1/claims").authorization_bearer(&customer).await.json();

        server
            .post(&claim_path(own_claim.id, "/insurance/lock"))
            .authorization_bearer(&customer)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let locked: Value = server
            .post(&claim_path(shop_claim.id, "/insurance/lock"))
            .authorization_bearer(&shop)
            .await
            .json();
        assert_eq!(locked["locked"], true);
    }

    #[tokio::test]
    async fn test_invalid_agent_email() {
        let (server, _) = test_server();
        let (shop, _) = login(&server, "body_shop", "Shop").await;
        let claim: Claim = server.post("/api/v1/claims").authorization_bearer(&shop).await.json();

        server
            .put(&claim_path(claim.id, "/insurance"))
            .authorization_bearer(&shop)
            .json(&json!({ "provider": "Geico", "agent_email": "not-an-email" }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

mod scheduling_tests {
    use super::*;

    fn schedule_json() -> BodyShopSchedule {
        let time = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        BodyShopSchedule::new(UserId::new(), Timezone::default())
            .with_day(DaySchedule::new(Weekday::Mon, time(8), time(12)))
    }

    #[tokio::test]
    async fn test_book_and_double_book() {
        let (server, notifier) = test_server();
        let (shop, shop_id) = login(&server, "body_shop", "Shop").await;
        let (customer, customer_id) = login(&server, "customer", "Pat").await;

        let published: BodyShopSchedule = server
            .put("/api/v1/schedules")
            .authorization_bearer(&shop)
            .json(&schedule_json())
            .await
            .json();
        assert_eq!(published.body_shop_id, shop_id);

        let monday = next_monday();
        let slots: Value = server
            .get(&format!("/api/v1/schedules/{}/slots", shop_id.as_uuid()))
            .add_query_param("date", monday)
            .authorization_bearer(&customer)
            .await
            .json();
        assert_eq!(slots["slots"].as_array().unwrap().len(), 4);

        let claim: Claim = server.post("/api/v1/claims").authorization_bearer(&customer).await.json();
        let request = BookingRequest {
            claim_id: claim.id,
            body_shop_id: shop_id,
            customer_id: UserId::new(),
            date: monday,
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            appointment_type: AppointmentType::DropOff,
            loaner_car_request: None,
            delivery_address: None,
            notes: None,
        };

        let booked = server
            .post("/api/v1/appointments")
            .authorization_bearer(&customer)
            .json(&request)
            .await;
        booked.assert_status(StatusCode::CREATED);
        let booked: Value = booked.json();
        assert_eq!(booked["customer_id"], json!(customer_id));
        assert_eq!(booked["status"], "pending");

        server
            .post("/api/v1/appointments")
            .authorization_bearer(&customer)
            .json(&request)
            .await
            .assert_status(StatusCode::CONFLICT);

        let id = booked["id"].as_str().unwrap();
        server
            .post(&format!("/api/v1/appointments/{}/confirm", id))
            .authorization_bearer(&customer)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        let confirmed: Value = server
            .post(&format!("/api/v1/appointments/{}/confirm", id))
            .authorization_bearer(&shop)
            .await
            .json();
        assert_eq!(confirmed["status"], "confirmed");

        assert!(!notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_shop_has_no_schedule() {
        let (server, _) = test_server();
        let (customer, _) = login(&server, "customer", "Pat").await;
        server
            .get(&format!("/api/v1/schedules/{}/slots", UserId::new().as_uuid()))
            .add_query_param("date", next_monday())
            .authorization_bearer(&customer)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod messaging_tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_read() {
        let (server, notifier) = test_server();
        let (customer, _) = login(&server, "customer", "Pat").await;
        let (shop, shop_id) = login(&server, "body_shop", "Shop").await;
        let (stranger, _) = login(&server, "customer", "Lee").await;

        let claim: Claim = server.post("/api/v1/claims").authorization_bearer(&customer).await.json();
        let conversation: Value = server
            .post("/api/v1/conversations")
            .authorization_bearer(&customer)
            .json(&json!({ "claim_id": claim.id, "participants": [shop_id] }))
            .await
            .json();
        let id = conversation["id"].as_str().unwrap().to_string();

        server
            .post(&format!("/api/v1/conversations/{}/messages", id))
            .authorization_bearer(&shop)
            .json(&json!({ "text": "Your bumper is in stock." }))
            .await
            .assert_status(StatusCode::CREATED);

        let unread: Value = server
            .get("/api/v1/conversations/unread")
            .authorization_bearer(&customer)
            .await
            .json();
        assert_eq!(unread["unread"], 1);

        let marked: Value = server
            .post(&format!("/api/v1/conversations/{}/read", id))
            .authorization_bearer(&customer)
            .await
            .json();
        assert_eq!(marked["updated"], 1);

        let unread: Value = server
            .get("/api/v1/conversations/unread")
            .authorization_bearer(&customer)
            .await
            .json();
        assert_eq!(unread["unread"], 0);

        server
            .post(&format!("/api/v1/conversations/{}/messages", id))
            .authorization_bearer(&stranger)
            .json(&json!({ "text": "hello" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        assert!(notifier.sent().await.iter().any(|n| n.title == "New Message"));
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (server, _) = test_server();
        let (customer, _) = login(&server, "customer", "Pat").await;
        let claim: Claim = server.post("/api/v1/claims").authorization_bearer(&customer).await.json();
        let conversation: Value = server
            .post("/api/v1/conversations")
            .authorization_bearer(&customer)
            .json(&json!({ "claim_id": claim.id }))
            .await
            .json();

        server
            .post(&format!("/api/v1/conversations/{}/messages", conversation["id"].as_str().unwrap()))
            .authorization_bearer(&customer)
            .json(&json!({ "text": "   " }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
