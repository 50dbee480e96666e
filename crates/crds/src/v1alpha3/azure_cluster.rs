//! AzureCluster CRD (v1alpha3)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::NetworkSpec;
use crate::capi::{APIEndpoint, ObjectReference};
use crate::v1beta1::{AzureClusterStatus, Tags};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1alpha3",
    kind = "AzureCluster",
    namespaced,
    status = "AzureClusterStatus",
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AzureClusterSpec {
    #[serde(default, rename = "subscriptionID", skip_serializing_if = "String::is_empty")]
    pub subscription_id: String,

    #[serde(default)]
    pub location: String,

    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub additional_tags: Tags,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_ref: Option<ObjectReference>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub azure_environment: String,

    #[serde(default)]
    pub network_spec: NetworkSpec,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group: String,

    #[serde(default)]
    pub control_plane_endpoint: APIEndpoint,
}
