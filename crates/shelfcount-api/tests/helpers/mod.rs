//! Test helpers: build AppState and router for integration tests.
//!
//! Everything runs against the in-memory store; no external services are needed.
//! Run from workspace root: `cargo test -p shelfcount-api`.

#![allow(dead_code)]

use axum_test::TestServer;
use shelfcount_api::setup::{routes, services};
use shelfcount_api::AppState;
use shelfcount_core::{Config, ProvisioningConfig};
use shelfcount_storage::MemoryStore;
use std::sync::Arc;

/// 1x1 PNG as a data URI
pub const PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8/5+hHgAHggJ/PchI7wAAAABJRU5ErkJggg==";

pub const CITY_FOLDER: &str = "สาขาตัวเมือง";

/// Test application: server plus the store behind it for inspection.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(ProvisioningConfig::development())
}

pub fn setup_test_app_with(config: ProvisioningConfig) -> TestApp {
    let config = Config(Box::new(config));
    let store = Arc::new(MemoryStore::default());
    let state = services::build_state(&config, store.clone()).expect("Failed to build state");
    let app = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        store,
        state,
    }
}
