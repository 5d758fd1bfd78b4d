//! Integration tests for `/api/v1/reservations`.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, patch_json, post_json, small_floor, TestApp, BOOKING_DATE};
use serde_json::json;
use tablebook_core::store::InMemoryStore;
use tablebook_events::bus::{RESERVATION_CREATED, RESERVATION_STATUS_CHANGED};

fn booking(time: &str, party_size: i32) -> serde_json::Value {
    json!({
        "customer_name": "Ana García",
        "customer_email": "ana@example.com",
        "customer_phone": "+34600111222",
        "date": BOOKING_DATE,
        "time": time,
        "party_size": party_size,
        "consent": { "data_processing": true, "email": true, "marketing": false },
    })
}

fn app() -> TestApp {
    build_test_app(InMemoryStore::with_tables(small_floor()))
}

async fn create(app: &TestApp, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    submit(app, "/api/v1/reservations", body).await
}

async fn create_as_staff(app: &TestApp, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    submit(app, "/api/v1/admin/reservations", body).await
}

async fn submit(app: &TestApp, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = post_json(app, uri, body).await;
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn public_booking_gets_best_table_and_starts_pending() {
    let app = app();
    let mut events = app.event_bus.subscribe();

    let (status, json) = create(&app, booking("19:00:00", 2)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["table_ids"], json!([1]));

    let event = events.try_recv().unwrap();
    assert_eq!(event.event_type, RESERVATION_CREATED);
    assert_eq!(event.reservation_id, json["data"]["reservation_id"].as_i64());
    assert_eq!(event.payload["customer_email"], "ana@example.com");
}

#[tokio::test]
async fn taken_table_is_a_conflict() {
    let app = app();
    let mut body = booking("19:00:00", 2);
    body["table_ids"] = json!([2]);

    let (first, _) = create(&app, body.clone()).await;
    assert_eq!(first, StatusCode::CREATED);

    // Same table an hour later still overlaps the turnover window.
    body["time"] = json!("19:45:00");
    let (second, json) = create(&app, body).await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn auto_assignment_with_nothing_left_is_a_conflict() {
    let app = build_test_app(InMemoryStore::with_tables(vec![common::table(
        1, 4, "INTERIOR", 0.0, 0.0,
    )]));

    assert_eq!(create(&app, booking("19:00:00", 2)).await.0, StatusCode::CREATED);
    let (status, json) = create(&app, booking("19:00:00", 2)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn slot_ceiling_binds_public_but_not_admin_bookings() {
    let app = app();
    // Dinner ceiling per slot is 8 with the default configuration.
    let mut terrace = booking("19:00:00", 6);
    terrace["table_ids"] = json!([3]);
    assert_eq!(create(&app, terrace).await.0, StatusCode::CREATED);

    let mut public = booking("19:00:00", 4);
    public["table_ids"] = json!([2]);
    let (status, json) = create(&app, public.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("19:00"));

    let (status, json) = create_as_staff(&app, public).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "confirmed");
}

#[tokio::test]
async fn origin_in_the_body_grants_nothing() {
    let app = app();
    let mut body = booking("20:00:00", 4);
    body["origin"] = json!("admin");
    body["consent"]["data_processing"] = json!(false);

    let (status, json) = create(&app, body.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    // With consent the body's origin is still ignored: pending, and the
    // 20:00 ceiling of 8 stops the third party of 4.
    body["consent"]["data_processing"] = json!(true);
    let (first, json) = create(&app, body.clone()).await;
    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(create(&app, body.clone()).await.0, StatusCode::CREATED);
    assert_eq!(create(&app, body).await.0, StatusCode::CONFLICT);
}

#[tokio::test]
async fn staff_auto_assignment_goes_over_the_ceiling() {
    let app = app();
    let mut terrace = booking("19:00:00", 6);
    terrace["table_ids"] = json!([3]);
    assert_eq!(create(&app, terrace).await.0, StatusCode::CREATED);

    // 6 + 4 exceeds the slot ceiling of 8; T2 is still free.
    let (status, json) = create_as_staff(&app, booking("19:00:00", 4)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["table_ids"], json!([2]));
    assert_eq!(json["data"]["status"], "confirmed");

    // Tables stay exclusive for staff too.
    let (status, _) = create_as_staff(&app, booking("19:00:00", 4)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn public_booking_requires_consent() {
    let app = app();
    let mut body = booking("19:00:00", 2);
    body["consent"]["data_processing"] = json!(false);

    let (status, json) = create(&app, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn past_dates_are_rejected() {
    let app = app();
    let mut body = booking("19:00:00", 2);
    body["date"] = json!("2020-01-03");

    assert_eq!(create(&app, body).await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_contact_details_are_rejected() {
    let app = app();
    let mut body = booking("19:00:00", 2);
    body["customer_email"] = json!("not-an-email");

    let (status, json) = create(&app, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn status_follows_the_state_machine() {
    let app = app();
    let mut events = app.event_bus.subscribe();
    let (_, created) = create(&app, booking("19:00:00", 2)).await;
    let id = created["data"]["reservation_id"].as_i64().unwrap();
    let uri = format!("/api/v1/reservations/{id}/status");

    let response = patch_json(&app, &uri, json!({ "status": "confirmed" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["from"], "pending");
    assert_eq!(json["data"]["to"], "confirmed");

    let _created = events.try_recv().unwrap();
    let changed = events.try_recv().unwrap();
    assert_eq!(changed.event_type, RESERVATION_STATUS_CHANGED);
    assert_eq!(changed.payload["to"], "confirmed");

    let back = patch_json(&app, &uri, json!({ "status": "pending" })).await;
    assert_eq!(back.status(), StatusCode::BAD_REQUEST);

    let unknown = patch_json(&app, &uri, json!({ "status": "waitlisted" })).await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_of_missing_reservation_is_404() {
    let app = app();
    let response = patch_json(
        &app,
        "/api/v1/reservations/999/status",
        json!({ "status": "cancelled" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn cancelled_reservation_frees_its_table() {
    let app = build_test_app(InMemoryStore::with_tables(vec![common::table(
        1, 4, "INTERIOR", 0.0, 0.0,
    )]));
    let (_, created) = create(&app, booking("19:00:00", 2)).await;
    let id = created["data"]["reservation_id"].as_i64().unwrap();

    let cancel = patch_json(
        &app,
        &format!("/api/v1/reservations/{id}/status"),
        json!({ "status": "cancelled" }),
    )
    .await;
    assert_eq!(cancel.status(), StatusCode::OK);

    assert_eq!(create(&app, booking("19:00:00", 2)).await.0, StatusCode::CREATED);
}
