//! Conversion endpoint
//!
//! `POST /convert` answers `apiextensions.k8s.io/v1` `ConversionReview`s.
//! Every object is routed through the hub; if any object fails, the whole
//! review fails and nothing is returned.

use axum::Json;
use azure_crds::conversion::convert_object;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::WebhookError;

/// Conversion review status reported on success.
pub const STATUS_SUCCESS: &str = "Success";

/// Conversion review status reported on failure.
pub const STATUS_FAILURE: &str = "Failure";

/// Kubernetes ConversionReview request and response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReview {
    /// `apiextensions.k8s.io/v1`, echoed back
    pub api_version: String,
    /// `ConversionReview`
    pub kind: String,
    /// Set by the API server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ConversionRequest>,
    /// Set by the webhook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ConversionResponse>,
}

/// Objects to convert
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    /// Request identifier, copied into the response
    pub uid: String,
    /// Target `group/version`
    #[serde(rename = "desiredAPIVersion")]
    pub desired_api_version: String,
    /// Objects in any served version
    #[serde(default)]
    pub objects: Vec<Value>,
}

/// Converted objects and the outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    /// Uid of the request
    pub uid: String,
    /// Converted objects in request order; empty on failure
    #[serde(default)]
    pub converted_objects: Vec<Value>,
    /// Outcome
    pub result: ConversionResult,
}

/// Status of a conversion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// `Success` or `Failure`
    pub status: String,
    /// Reason of a failure
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Handle a conversion review.
pub async fn convert_handler(Json(review): Json<ConversionReview>) -> Result<Json<ConversionReview>, WebhookError> {
    let request = review
        .request
        .ok_or_else(|| WebhookError::InvalidReview("conversion review has no request".to_string()))?;
    info!(
        uid = %request.uid,
        desired = %request.desired_api_version,
        objects = request.objects.len(),
        "Converting objects"
    );

    Ok(Json(ConversionReview {
        api_version: review.api_version,
        kind: review.kind,
        request: None,
        response: Some(convert(&request)),
    }))
}

/// Converts every object of `request`, or none of them.
pub fn convert(request: &ConversionRequest) -> ConversionResponse {
    let converted: Result<Vec<Value>, _> = request
        .objects
        .iter()
        .map(|object| convert_object(object, &request.desired_api_version))
        .collect();

    match converted {
        Ok(converted_objects) => {
            debug!(uid = %request.uid, "Converted {} objects", converted_objects.len());
            ConversionResponse {
                uid: request.uid.clone(),
                converted_objects,
                result: ConversionResult {
                    status: STATUS_SUCCESS.to_string(),
                    message: String::new(),
                },
            }
        }
        Err(e) => {
            warn!(uid = %request.uid, error = %e, "Conversion failed");
            ConversionResponse {
                uid: request.uid.clone(),
                converted_objects: Vec::new(),
                result: ConversionResult {
                    status: STATUS_FAILURE.to_string(),
                    message: e.to_string(),
                },
            }
        }
    }
}
