//! AzureClusterIdentity CRD (v1alpha3)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::capi::SecretReference;
use crate::v1beta1::{AllowedNamespaces, AzureClusterIdentityStatus};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1alpha3",
    kind = "AzureClusterIdentity",
    namespaced,
    status = "AzureClusterIdentityStatus",
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AzureClusterIdentitySpec {
    #[serde(rename = "type")]
    pub type_: IdentityType,

    #[serde(default, rename = "resourceID", skip_serializing_if = "String::is_empty")]
    pub resource_id: String,

    #[serde(default, rename = "clientID")]
    pub client_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<SecretReference>,

    #[serde(default, rename = "tenantID")]
    pub tenant_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_namespaces: Option<AllowedNamespaces>,
}

/// Identity types served by v1alpha3.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum IdentityType {
    #[default]
    ServicePrincipal,
    UserAssignedMSI,
    /// Credentials supplied out of band; removed in later versions
    ManualServicePrincipal,
}
