//! Admission endpoints
//!
//! `POST /mutate/{kind}` runs the hub defaulter and answers with a JSON
//! patch from the submitted object to the defaulted one.
//! `POST /validate/{kind}` runs the hub validator for the request
//! operation; a denial carries every field error in one message.

use std::str::FromStr;

use axum::Json;
use axum::extract::Path;
use azure_crds::v1beta1::{
    AzureCluster, AzureClusterIdentity, AzureClusterTemplate, AzureMachine, AzureMachineTemplate,
};
use azure_crds::{Defaulter, Validator};
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::WebhookError;

/// Hub kinds with admission hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubKind {
    AzureCluster,
    AzureClusterTemplate,
    AzureClusterIdentity,
    AzureMachine,
    AzureMachineTemplate,
}

impl HubKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HubKind::AzureCluster => "AzureCluster",
            HubKind::AzureClusterTemplate => "AzureClusterTemplate",
            HubKind::AzureClusterIdentity => "AzureClusterIdentity",
            HubKind::AzureMachine => "AzureMachine",
            HubKind::AzureMachineTemplate => "AzureMachineTemplate",
        }
    }
}

/// Parses the `{kind}` path segment, ignoring case.
impl FromStr for HubKind {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "azurecluster" => Ok(HubKind::AzureCluster),
            "azureclustertemplate" => Ok(HubKind::AzureClusterTemplate),
            "azureclusteridentity" => Ok(HubKind::AzureClusterIdentity),
            "azuremachine" => Ok(HubKind::AzureMachine),
            "azuremachinetemplate" => Ok(HubKind::AzureMachineTemplate),
            _ => Err(WebhookError::UnknownKind(s.to_string())),
        }
    }
}

/// Handle mutating admission review for a hub kind.
pub async fn mutate_handler(
    Path(kind): Path<String>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Result<Json<AdmissionReview<DynamicObject>>, WebhookError> {
    let kind: HubKind = kind.parse()?;
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Failed to parse admission request");
            return Ok(Json(AdmissionResponse::invalid(e.to_string()).into_review()));
        }
    };
    info!(uid = %request.uid, kind = kind.as_str(), operation = ?request.operation, "Defaulting object");

    let response = match kind {
        HubKind::AzureCluster => mutate::<AzureCluster>(&request),
        HubKind::AzureClusterTemplate => mutate::<AzureClusterTemplate>(&request),
        HubKind::AzureClusterIdentity => mutate::<AzureClusterIdentity>(&request),
        HubKind::AzureMachine => mutate::<AzureMachine>(&request),
        HubKind::AzureMachineTemplate => mutate::<AzureMachineTemplate>(&request),
    };
    Ok(Json(response.into_review()))
}

/// Handle validating admission review for a hub kind.
pub async fn validate_handler(
    Path(kind): Path<String>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Result<Json<AdmissionReview<DynamicObject>>, WebhookError> {
    let kind: HubKind = kind.parse()?;
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Failed to parse admission request");
            return Ok(Json(AdmissionResponse::invalid(e.to_string()).into_review()));
        }
    };
    info!(uid = %request.uid, kind = kind.as_str(), operation = ?request.operation, "Validating object");

    let response = match kind {
        HubKind::AzureCluster => validate::<AzureCluster>(&request),
        HubKind::AzureClusterTemplate => validate::<AzureClusterTemplate>(&request),
        HubKind::AzureClusterIdentity => validate::<AzureClusterIdentity>(&request),
        HubKind::AzureMachine => validate::<AzureMachine>(&request),
        HubKind::AzureMachineTemplate => validate::<AzureMachineTemplate>(&request),
    };
    Ok(Json(response.into_review()))
}

fn mutate<K>(request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse
where
    K: Defaulter + Serialize + DeserializeOwned,
{
    let Some(object) = &request.object else {
        debug!(uid = %request.uid, "No object in request, allowing unchanged");
        return AdmissionResponse::from(request);
    };

    let patch = match default_patch::<K>(object) {
        Ok(patch) => patch,
        Err(e) => {
            warn!(uid = %request.uid, error = %e, "Defaulting failed");
            return AdmissionResponse::from(request).deny(e.to_string());
        }
    };
    debug!(uid = %request.uid, patch_ops = patch.0.len(), "Applying defaults");

    match AdmissionResponse::from(request).with_patch(patch) {
        Ok(response) => response,
        Err(e) => AdmissionResponse::from(request).deny(format!("patch serialization error: {e}")),
    }
}

/// JSON patch from `object` as submitted to its defaulted form.
///
/// The API server applies the patch to the raw object, not to the decoded
/// value with its serde defaults filled in.
fn default_patch<K>(object: &DynamicObject) -> Result<json_patch::Patch, WebhookError>
where
    K: Defaulter + Serialize + DeserializeOwned,
{
    let raw = serde_json::to_value(object)?;
    let mut typed: K = serde_json::from_value(raw.clone())?;
    typed.set_defaults()?;
    let defaulted = serde_json::to_value(&typed)?;
    Ok(json_patch::diff(&raw, &defaulted))
}

fn validate<K>(request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse
where
    K: Validator + DeserializeOwned,
{
    match check::<K>(request) {
        Ok(()) => AdmissionResponse::from(request),
        Err(e) => {
            info!(uid = %request.uid, error = %e, "Denying object");
            AdmissionResponse::from(request).deny(e.to_string())
        }
    }
}

fn check<K>(request: &AdmissionRequest<DynamicObject>) -> Result<(), WebhookError>
where
    K: Validator + DeserializeOwned,
{
    match request.operation {
        Operation::Create => {
            let object: K = decode(required(request.object.as_ref(), "object")?)?;
            object.validate_create()?;
        }
        Operation::Update => {
            let object: K = decode(required(request.object.as_ref(), "object")?)?;
            let old: K = decode(required(request.old_object.as_ref(), "oldObject")?)?;
            object.validate_update(&old)?;
        }
        Operation::Delete => {
            let old: K = decode(required(request.old_object.as_ref(), "oldObject")?)?;
            old.validate_delete()?;
        }
        Operation::Connect => {}
    }
    Ok(())
}

fn required<'a>(object: Option<&'a DynamicObject>, field: &str) -> Result<&'a DynamicObject, WebhookError> {
    object.ok_or_else(|| WebhookError::InvalidReview(format!("request has no {field}")))
}

fn decode<K: DeserializeOwned>(object: &DynamicObject) -> Result<K, WebhookError> {
    Ok(serde_json::from_value(serde_json::to_value(object)?)?)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use azure_crds::v1beta1::AzureClusterSpec;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;
    use crate::test_utils::{TEST_UID, admission_review, decoded_patch, post};

    fn cluster_object(spec: Value) -> Value {
        json!({
            "apiVersion": "infrastructure.cluster.x-k8s.io/v1beta1",
            "kind": "AzureCluster",
            "metadata": {"name": "foo", "namespace": "default"},
            "spec": spec,
        })
    }

    fn machine_object(ssh_public_key: &str) -> Value {
        json!({
            "apiVersion": "infrastructure.cluster.x-k8s.io/v1beta1",
            "kind": "AzureMachine",
            "metadata": {"name": "foo-md-0", "namespace": "default"},
            "spec": {
                "vmSize": "Standard_D2s_v3",
                "osDisk": {"osType": "Linux", "diskSizeGB": 128},
                "sshPublicKey": ssh_public_key,
            },
        })
    }

    fn defaulted_cluster() -> Value {
        let mut cluster = AzureCluster::new(
            "foo",
            AzureClusterSpec {
                location: "eastus".to_string(),
                ..Default::default()
            },
        );
        cluster.metadata.namespace = Some("default".to_string());
        cluster.set_defaults().unwrap();
        serde_json::to_value(&cluster).unwrap()
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!("azurecluster".parse::<HubKind>().unwrap(), HubKind::AzureCluster);
        assert_eq!("AzureMachineTemplate".parse::<HubKind>().unwrap(), HubKind::AzureMachineTemplate);
        assert!(matches!("azuremanagedcluster".parse::<HubKind>(), Err(WebhookError::UnknownKind(_))));
    }

    #[tokio::test]
    async fn test_mutate_cluster_patches_defaults() {
        let review = admission_review("AzureCluster", "CREATE", cluster_object(json!({"location": "eastus"})), Value::Null);
        let (status, body) = post("/mutate/azurecluster", review).await;
        assert_eq!(status, StatusCode::OK);

        let response = &body["response"];
        assert_eq!(response["uid"], TEST_UID);
        assert_eq!(response["allowed"], true);
        assert_eq!(response["patchType"], "JSONPatch");

        let patch = decoded_patch(response);
        let ops = patch.as_array().unwrap();
        assert!(
            ops.iter().any(|op| op["path"] == "/spec/resourceGroup" && op["value"] == "foo"),
            "{patch}"
        );
        assert!(
            ops.iter()
                .filter_map(|op| op["path"].as_str())
                .any(|path| path.starts_with("/spec/networkSpec")),
            "{patch}"
        );
    }

    #[tokio::test]
    async fn test_mutate_patch_applies_to_submitted_cluster() {
        let submitted = cluster_object(json!({"location": "eastus"}));
        let review = admission_review("AzureCluster", "CREATE", submitted.clone(), Value::Null);
        let (_, body) = post("/mutate/azurecluster", review).await;

        let patch: json_patch::Patch = serde_json::from_value(decoded_patch(&body["response"])).unwrap();
        let mut patched = submitted;
        json_patch::patch(&mut patched, &patch).unwrap();
        assert_eq!(patched, defaulted_cluster());
    }

    #[tokio::test]
    async fn test_mutate_patch_applies_to_submitted_machine() {
        let submitted = machine_object("");
        let review = admission_review("AzureMachine", "CREATE", submitted.clone(), Value::Null);
        let (_, body) = post("/mutate/azuremachine", review).await;
        assert_eq!(body["response"]["allowed"], true);

        let patch: json_patch::Patch = serde_json::from_value(decoded_patch(&body["response"])).unwrap();
        let mut patched = submitted;
        json_patch::patch(&mut patched, &patch).unwrap();
        assert!(!patched["spec"]["sshPublicKey"].as_str().unwrap().is_empty());
        let machine: AzureMachine = serde_json::from_value(patched).unwrap();
        assert_eq!(machine.spec.os_disk.caching_type, "None");
    }

    #[tokio::test]
    async fn test_mutate_defaulted_cluster_is_empty_patch() {
        let review = admission_review("AzureCluster", "CREATE", defaulted_cluster(), Value::Null);
        let (_, body) = post("/mutate/azurecluster", review).await;
        assert_eq!(decoded_patch(&body["response"]), json!([]));
    }

    #[tokio::test]
    async fn test_validate_create_allows_defaulted_cluster() {
        let review = admission_review("AzureCluster", "CREATE", defaulted_cluster(), Value::Null);
        let (status, body) = post("/validate/azurecluster", review).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"]["allowed"], true);
    }

    #[tokio::test]
    async fn test_validate_create_denies_with_field_errors() {
        let mut cluster = defaulted_cluster();
        cluster["spec"]["resourceGroup"] = json!("bad rg!");
        let review = admission_review("AzureCluster", "CREATE", cluster, Value::Null);
        let (_, body) = post("/validate/azurecluster", review).await;

        let response = &body["response"];
        assert_eq!(response["allowed"], false);
        let message = response["status"]["message"].as_str().unwrap();
        assert!(message.starts_with("AzureCluster.infrastructure.cluster.x-k8s.io \"foo\" is invalid"), "{message}");
        assert!(message.contains("spec.resourceGroup"), "{message}");
    }

    #[tokio::test]
    async fn test_validate_update_checks_immutability() {
        let review = admission_review(
            "AzureMachine",
            "UPDATE",
            machine_object("bmV3LWtleQ=="),
            machine_object("b2xkLWtleQ=="),
        );
        let (_, body) = post("/validate/azuremachine", review).await;
        let response = &body["response"];
        assert_eq!(response["allowed"], false);
        let message = response["status"]["message"].as_str().unwrap();
        assert!(message.contains("spec.SSHPublicKey"), "{message}");

        let review = admission_review(
            "AzureMachine",
            "UPDATE",
            machine_object("b2xkLWtleQ=="),
            machine_object("b2xkLWtleQ=="),
        );
        let (_, body) = post("/validate/azuremachine", review).await;
        assert_eq!(body["response"]["allowed"], true);
    }

    #[tokio::test]
    async fn test_validate_update_without_old_object_is_denied() {
        let review = admission_review("AzureCluster", "UPDATE", defaulted_cluster(), Value::Null);
        let (_, body) = post("/validate/azurecluster", review).await;
        let response = &body["response"];
        assert_eq!(response["allowed"], false);
        assert!(response["status"]["message"].as_str().unwrap().contains("oldObject"));
    }

    #[tokio::test]
    async fn test_validate_delete_is_allowed() {
        let review = admission_review("AzureCluster", "DELETE", Value::Null, defaulted_cluster());
        let (_, body) = post("/validate/azurecluster", review).await;
        assert_eq!(body["response"]["allowed"], true);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_not_found() {
        let review = admission_review("AzureManagedCluster", "CREATE", cluster_object(json!({})), Value::Null);
        let (status, body) = post("/validate/azuremanagedcluster", review).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Unknown kind: azuremanagedcluster");
    }
}
