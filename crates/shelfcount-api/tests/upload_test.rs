//! Multi-channel test upload tests.

mod helpers;

use helpers::{setup_test_app, setup_test_app_with, CITY_FOLDER, PIXEL_PNG};
use serde_json::json;
use shelfcount_api::setup::services;
use shelfcount_core::{Config, ProvisioningConfig};
use shelfcount_storage::MemoryStore;
use std::sync::Arc;
use shelfcount_storage::{InjectedFailure, StoreOperation};

#[tokio::test]
async fn test_unauthorized_direct_channel_is_partial_failure() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/test_upload")
        .json(&json!({ "image_data": PIXEL_PNG, "branch": "CITY" }))
        .await;

    assert_eq!(response.status_code(), 200);
    let data: serde_json::Value = response.json();
    assert_eq!(data["success"], true);
    assert_eq!(data["successful_methods"], json!(["relay"]));
    assert_eq!(data["results"].as_object().unwrap().len(), 2);
    assert_eq!(data["results"]["relay"]["success"], true);
    assert!(data["results"]["relay"]["url"].as_str().is_some());
    assert_eq!(data["results"]["direct"]["success"], false);
    assert!(data["results"]["direct"]["error"]
        .as_str()
        .unwrap()
        .contains("not authorized"));

    assert_eq!(app.store.file_count(), 1);
    assert_eq!(app.store.count_folders_named(CITY_FOLDER), 1);
}

#[tokio::test]
async fn test_both_channels_after_authorization() {
    let app = setup_test_app();
    app.client()
        .post("/authorize_drive")
        .json(&json!({ "access_token": "ya29.token" }))
        .await
        .assert_status_ok();

    let data: serde_json::Value = app
        .client()
        .post("/test_upload")
        .json(&json!({ "image_data": PIXEL_PNG, "branch": "SCHOOL" }))
        .await
        .json();

    assert_eq!(data["success"], true);
    assert_eq!(data["successful_methods"], json!(["relay", "direct"]));
    assert_eq!(app.store.file_count(), 2);
}

#[tokio::test]
async fn test_all_channels_failing() {
    let app = setup_test_app();
    app.store
        .inject_failure(StoreOperation::CreateFile, InjectedFailure::Unavailable);

    let response = app
        .client()
        .post("/test_upload")
        .json(&json!({ "image_data": PIXEL_PNG, "branch": "CITY" }))
        .await;

    assert_eq!(response.status_code(), 200);
    let data: serde_json::Value = response.json();
    assert_eq!(data["success"], false);
    assert_eq!(data["successful_methods"], json!([]));
    assert_eq!(data["results"].as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_branch_defaults_and_unknown_codes() {
    let app = setup_test_app();

    app.client()
        .post("/test_upload")
        .json(&json!({ "image_data": PIXEL_PNG }))
        .await
        .assert_status_ok();
    assert_eq!(app.store.count_folders_named(CITY_FOLDER), 1);

    app.client()
        .post("/test_upload")
        .json(&json!({ "image_data": PIXEL_PNG, "branch": "WAREHOUSE" }))
        .await
        .assert_status_ok();
    assert_eq!(app.store.count_folders_named("WAREHOUSE"), 1);
}

#[tokio::test]
async fn test_decoding_failure_aborts_before_channels() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/test_upload")
        .json(&json!({ "image_data": "data:image/png;base64,%%%", "branch": "CITY" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "INVALID_ENCODING");
    assert_eq!(data["recoverable"], false);
    assert_eq!(app.store.folder_count(), 0);
}

#[tokio::test]
async fn test_empty_image_data() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/test_upload")
        .json(&json!({ "image_data": "", "branch": "CITY" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_missing_image_data_field() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/test_upload")
        .json(&json!({ "branch": "CITY" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let data: serde_json::Value = response.json();
    assert_eq!(data["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_single_channel_configuration() {
    let mut config = ProvisioningConfig::development();
    config.upload_channels = vec!["direct".to_string()];
    let app = setup_test_app_with(config);

    let data: serde_json::Value = app
        .client()
        .post("/test_upload")
        .json(&json!({ "image_data": PIXEL_PNG, "branch": "CITY" }))
        .await
        .json();

    assert_eq!(data["success"], false);
    assert_eq!(data["results"].as_object().unwrap().len(), 1);
    assert!(data["results"].get("relay").is_none());
}

#[test]
fn test_duplicate_channel_names_rejected() {
    let mut inner = ProvisioningConfig::development();
    inner.upload_channels = vec!["relay".to_string(), "relay".to_string()];
    let config = Config(Box::new(inner));

    assert!(config.validate().is_err());
    assert!(services::build_state(&config, Arc::new(MemoryStore::default())).is_err());
}
