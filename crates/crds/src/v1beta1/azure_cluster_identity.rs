//! AzureClusterIdentity CRD (hub version)
//!
//! Credentials a cluster uses to talk to Azure, and which namespaces
//! may reference them.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::capi::SecretReference;

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "AzureClusterIdentity",
    namespaced,
    status = "AzureClusterIdentityStatus",
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AzureClusterIdentitySpec {
    /// Identity type
    #[serde(rename = "type")]
    pub type_: IdentityType,

    /// ARM ID of a user-assigned managed identity
    #[serde(default, rename = "resourceID", skip_serializing_if = "String::is_empty")]
    pub resource_id: String,

    /// Service principal or managed identity client ID
    #[serde(default, rename = "clientID")]
    pub client_id: String,

    /// Secret holding the service principal password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<SecretReference>,

    /// Azure AD tenant
    #[serde(default, rename = "tenantID")]
    pub tenant_id: String,

    /// Namespaces allowed to use this identity; unset allows only the identity's own namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_namespaces: Option<AllowedNamespaces>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AzureClusterIdentityStatus {
    /// Identity is usable
    #[serde(default)]
    pub ready: bool,
}

/// Kind of Azure credential.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum IdentityType {
    /// Service principal with a client secret
    #[default]
    ServicePrincipal,
    /// User-assigned managed identity
    UserAssignedMSI,
}

/// Namespaces permitted to reference an identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AllowedNamespaces {
    /// Explicit namespace names; empty allows every namespace
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<String>,
}
