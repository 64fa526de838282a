//! Common test utilities for in-process API testing with mocks.
//!
//! This module provides a test fixture that builds the router with a mock
//! fetcher and installer injected, so runs complete without network access
//! or real installers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::RwLock;
use tower::ServiceExt;

use quickinstall_core::{
    testing::{MockFetcher, MockInstaller},
    Catalog, Config, Orchestrator, OrchestratorConfig, SelectionState,
};
use quickinstall_server::api::{create_router, WsBroadcaster};
use quickinstall_server::events::spawn_event_pump;
use quickinstall_server::state::{AppState, StatusSnapshot};

/// Re-export fixtures for test convenience
pub use quickinstall_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_select_program() {
///     let fixture = TestFixture::new(fixtures::catalog_64(&["VLC"])).await;
///
///     let response = fixture
///         .put("/api/v1/programs/VLC/selection", json!({ "selected": true }))
///         .await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetcher - control downloads
    pub fetcher: MockFetcher,
    /// Mock installer - control installer exit codes
    pub installer: MockInstaller,
    /// Broadcaster the event pump publishes to
    pub broadcaster: WsBroadcaster,
    /// Download directory
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture serving `catalog`.
    pub async fn new(catalog: Catalog) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let fetcher = MockFetcher::new();
        let installer = MockInstaller::new();

        let config = Config {
            orchestrator: OrchestratorConfig::default().with_download_dir(temp_dir.path()),
            ..Default::default()
        };

        let (orchestrator, events) = Orchestrator::new(
            config.orchestrator.clone(),
            Arc::new(catalog),
            Arc::new(RwLock::new(SelectionState::default())),
            Arc::new(fetcher.clone()),
            Arc::new(installer.clone()),
        );

        let broadcaster = WsBroadcaster::default();
        let status = Arc::new(RwLock::new(StatusSnapshot::default()));
        let (run_states, _pump) =
            spawn_event_pump(events, Arc::clone(&status), broadcaster.clone());

        let state = Arc::new(AppState::new(
            config,
            Arc::new(orchestrator),
            status,
            run_states,
            broadcaster.clone(),
        ));

        Self {
            router: create_router(state),
            fetcher,
            installer,
            broadcaster,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// GET a non-JSON endpoint and return the body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Poll `/status` until the run is over and its terminal status arrived.
    pub async fn wait_for_run(&self) -> TestResponse {
        for _ in 0..200 {
            let response = self.get("/api/v1/status").await;
            let message = response.body["status"].as_str().unwrap_or_default();
            let terminal = matches!(
                message,
                "Download complete." | "Installation complete." | "No programs selected"
            );
            if terminal && response.body["running"] == false {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Run did not finish in time");
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
