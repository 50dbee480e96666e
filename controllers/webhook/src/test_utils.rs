//! Test utilities for driving the router in-process

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::server::router;

/// UID of every review built by `admission_review`.
pub const TEST_UID: &str = "705ab4f5-6393-11e8-b7cc-42010a800002";

/// Sends `body` as JSON to `uri` and returns the status and decoded response body.
pub async fn post(uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Helper to build an `admission.k8s.io/v1` review for a hub kind
pub fn admission_review(kind: &str, operation: &str, object: Value, old_object: Value) -> Value {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": TEST_UID,
            "kind": {
                "group": "infrastructure.cluster.x-k8s.io",
                "version": "v1beta1",
                "kind": kind,
            },
            "resource": {
                "group": "infrastructure.cluster.x-k8s.io",
                "version": "v1beta1",
                "resource": format!("{}s", kind.to_lowercase()),
            },
            "name": "foo",
            "namespace": "default",
            "operation": operation,
            "userInfo": {"username": "system:admin"},
            "object": object,
            "oldObject": old_object,
            "dryRun": false,
        },
    })
}

/// The JSON patch carried by an admission response.
pub fn decoded_patch(response: &Value) -> Value {
    let encoded = response["patch"].as_str().unwrap();
    let bytes = STANDARD.decode(encoded).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
