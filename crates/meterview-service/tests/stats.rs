//! Stats overview integration tests.

mod common;

use common::{meter, TestHarness};
use serde_json::{json, Value};

#[tokio::test]
async fn lists_cumulative_meters_and_resource_tree() {
    let harness = TestHarness::new().await;
    harness
        .mount_json(
            "/v2/meters",
            json!([
                meter("network.incoming.bytes", "cumulative", "u1", "p1", "vm-1"),
                meter("cpu_util", "gauge", "u1", "p1", "vm-1"),
                meter("disk.read.bytes", "cumulative", "u1", "p1", "vm-1"),
                meter("network.incoming.bytes", "cumulative", "u2", "p1", "vm-2"),
            ]),
        )
        .await;
    harness
        .mount_json(
            "/v2/resources",
            json!([
                {"resource_id": "vm-1", "project_id": "p1", "user_id": "u1", "metadata": {}},
                {"resource_id": "vm-2", "project_id": "p1", "user_id": "u2", "metadata": {}},
                {"resource_id": "vol-1", "project_id": "p1", "user_id": "u1", "metadata": {}}
            ]),
        )
        .await;

    let response = harness.server.get("/v1/stats").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body["meters"],
        json!(["network.incoming.bytes", "disk.read.bytes"])
    );
    assert_eq!(body["resources"]["p1"]["u1"], json!(["vm-1", "vol-1"]));
    assert_eq!(body["resources"]["p1"]["u2"], json!(["vm-2"]));
}

#[tokio::test]
async fn resource_failure_keeps_meters() {
    let harness = TestHarness::new().await;
    harness
        .mount_json(
            "/v2/meters",
            json!([meter("disk.write.bytes", "cumulative", "u1", "p1", "vm-1")]),
        )
        .await;
    harness.mount_failure("/v2/resources", 500).await;

    let response = harness.server.get("/v1/stats").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["meters"], json!(["disk.write.bytes"]));
    assert_eq!(body["resources"], json!({}));
}

#[tokio::test]
async fn missing_backend_yields_empty_stats() {
    let harness = TestHarness::unconfigured().await;

    let response = harness.server.get("/v1/stats").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["meters"], json!([]));
    assert_eq!(body["resources"], json!({}));
}
