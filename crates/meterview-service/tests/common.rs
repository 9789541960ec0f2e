//! Common test utilities for meterview integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use meterview_service::{create_router, AppState, ServiceConfig};

/// Test harness: the service under test and a mock OpenStack backend.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Mock serving both the metering (`/v2`) and identity (`/v3`) APIs.
    pub backend: MockServer,
}

impl TestHarness {
    /// Create a harness whose metering and identity services point at a
    /// fresh mock server.
    pub async fn new() -> Self {
        let backend = MockServer::start().await;
        let config = ServiceConfig {
            metering_url: Some(backend.uri()),
            identity_url: Some(backend.uri()),
            auth_token: Some("test-token".into()),
            ..test_config()
        };
        Self::build(config, backend)
    }

    /// Create a harness with no backends configured.
    pub async fn unconfigured() -> Self {
        let backend = MockServer::start().await;
        Self::build(test_config(), backend)
    }

    /// Create a harness with no backends and the given request body limit.
    pub async fn with_body_limit(max_body_bytes: usize) -> Self {
        let backend = MockServer::start().await;
        let config = ServiceConfig {
            max_body_bytes,
            ..test_config()
        };
        Self::build(config, backend)
    }

    fn build(config: ServiceConfig, backend: MockServer) -> Self {
        let state = AppState::new(config);
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");
        Self { server, backend }
    }

    /// Serve `body` as JSON on `GET route`.
    pub async fn mount_json(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.backend)
            .await;
    }

    /// Fail `GET route` with the given status.
    pub async fn mount_failure(&self, route: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string("backend down"))
            .mount(&self.backend)
            .await;
    }

    /// Serve the identity user and project listings.
    pub async fn mount_identity(&self) {
        self.mount_json(
            "/v3/users",
            json!({"users": [
                {"id": "u1", "name": "alice"},
                {"id": "u2", "name": "bob"}
            ]}),
        )
        .await;
        self.mount_json(
            "/v3/projects",
            json!({"projects": [
                {"id": "p1", "name": "demo"},
                {"id": "p2", "name": "Admin"}
            ]}),
        )
        .await;
    }
}

fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        backend_timeout_seconds: 5,
        statistics_concurrency: 4,
        cors_origins: vec!["*".into()],
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 30,
        ..ServiceConfig::default()
    }
}

/// A metering meter record.
pub fn meter(name: &str, meter_type: &str, user: &str, project: &str, resource: &str) -> Value {
    json!({
        "name": name,
        "type": meter_type,
        "unit": "B",
        "resource_id": resource,
        "user_id": user,
        "project_id": project,
        "source": "openstack"
    })
}

/// A statistic record with the given `max`.
pub fn statistic(max: f64) -> Value {
    json!([{
        "avg": max,
        "count": 1,
        "max": max,
        "min": max,
        "sum": max,
        "period": 0,
        "duration_start": "2013-07-08T10:00:00",
        "duration_end": "2013-07-08T11:00:00"
    }])
}

/// A sample record.
pub fn sample(name: &str, counter_type: &str, volume: f64, timestamp: &str) -> Value {
    json!({
        "counter_name": name,
        "counter_type": counter_type,
        "counter_unit": "B",
        "counter_volume": volume,
        "timestamp": timestamp,
        "resource_id": "vm-1",
        "resource_metadata": {},
        "source": "openstack"
    })
}
