//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly; no router involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use tablebook_api::error::AppError;
use tablebook_core::error::CoreError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let (status, json) = error_to_response(AppError::Core(CoreError::NotFound {
        entity: "reservation",
        id: 42,
    }))
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "reservation with id 42 not found");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Conflict("Table T4 is no longer available".into())))
            .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "Table T4 is no longer available");
}

#[tokio::test]
async fn store_unavailable_hides_details() {
    let (status, json) = error_to_response(AppError::Core(CoreError::StoreUnavailable(
        "pool timed out while waiting for an open connection".into(),
    )))
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "STORE_UNAVAILABLE");
    assert!(!json["error"].as_str().unwrap().contains("pool"));
}

#[tokio::test]
async fn internal_error_returns_500_with_generic_message() {
    let (status, json) = error_to_response(AppError::InternalError("secret detail".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
