#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tablebook_api::config::ServerConfig;
use tablebook_api::router::build_app_router;
use tablebook_api::state::AppState;
use tablebook_core::booking::BookingPolicy;
use tablebook_core::store::{InMemoryStore, ReservationStore};
use tablebook_core::table::DiningTable;
use tablebook_core::types::DbId;
use tablebook_events::EventBus;

/// A Friday far enough ahead that public bookings are always in the future.
pub const BOOKING_DATE: &str = "2099-01-02";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        booking: BookingPolicy::default(),
    }
}

pub fn table(id: DbId, capacity: i32, location: &str, x: f64, y: f64) -> DiningTable {
    DiningTable {
        id,
        number: format!("T{id}"),
        capacity,
        location: location.to_string(),
        is_active: true,
        position_x: x,
        position_y: y,
        width: 80.0,
        height: 80.0,
        rotation: 0.0,
    }
}

/// Two interior tables (2 and 4 seats) and a 6-seat terrace table.
pub fn small_floor() -> Vec<DiningTable> {
    vec![
        table(1, 2, "INTERIOR", 0.0, 100.0),
        table(2, 4, "INTERIOR", 150.0, 100.0),
        table(3, 6, "TERRACE", 0.0, 300.0),
    ]
}

/// Everything a test needs to drive the router and inspect its effects.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub event_bus: Arc<EventBus>,
}

/// Build the full application router over an in-memory store.
///
/// Uses the same `build_app_router` as `main.rs`, so the middleware stack
/// (CORS, request ID, timeout, tracing, panic recovery) is exercised too.
pub fn build_test_app(store: InMemoryStore) -> TestApp {
    let config = test_config();
    let store = Arc::new(store);
    let event_bus = Arc::new(EventBus::default());

    let state = AppState {
        store: Arc::clone(&store) as Arc<dyn ReservationStore>,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
    };
    let router = build_app_router(state, &config).unwrap();

    TestApp {
        router,
        store,
        event_bus,
    }
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    send_json(app, Method::POST, uri, body).await
}

pub async fn patch_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    send_json(app, Method::PATCH, uri, body).await
}

async fn send_json(
    app: &TestApp,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
