//! Delegated credential and health endpoint tests.

mod helpers;

use helpers::setup_test_app;
use serde_json::json;

#[tokio::test]
async fn test_drive_status_lifecycle() {
    let app = setup_test_app();

    let data: serde_json::Value = app.client().get("/drive_status").await.json();
    assert_eq!(data["authorized"], false);
    assert_eq!(data["message"], "Direct storage access not authorized");

    let response = app
        .client()
        .post("/authorize_drive")
        .json(&json!({ "access_token": "ya29.token" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let data: serde_json::Value = response.json();
    assert_eq!(data["authorized"], true);

    let data: serde_json::Value = app.client().get("/drive_status").await.json();
    assert_eq!(data["authorized"], true);
}

#[tokio::test]
async fn test_blank_token_rejected() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/authorize_drive")
        .json(&json!({ "access_token": "   " }))
        .await;
    assert_eq!(response.status_code(), 400);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "INVALID_INPUT");
    assert!(app.state.credentials.current().await.is_none());
}

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let data: serde_json::Value = response.json();
    assert_eq!(data["status"], "healthy");
    assert_eq!(data["backend"], "memory");
    assert_eq!(data["channels"], json!(["relay", "direct"]));

    let response = app.client().get("/health/live").await;
    assert_eq!(response.status_code(), 200);
}
