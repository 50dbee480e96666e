//! AzureClusterTemplate CRD
//!
//! Cluster class template. Only served at v1beta1, so it never converts.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::tags::Tags;
use super::types::{BastionSpec, CloudProviderConfigOverrides, NetworkSpec};
use crate::capi::ObjectReference;

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "AzureClusterTemplate",
    namespaced,
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AzureClusterTemplateSpec {
    /// Template for new AzureClusters
    pub template: AzureClusterTemplateResource,
}

/// Cluster template body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AzureClusterTemplateResource {
    /// Cluster spec without per-cluster fields
    pub spec: AzureClusterTemplateResourceSpec,
}

/// The cluster fields that may be shared by a class of clusters.
///
/// Names that derive from the cluster name (resource group, vnet,
/// subnets, load balancers) are filled in per cluster, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureClusterTemplateResourceSpec {
    /// Azure subscription
    #[serde(default, rename = "subscriptionID", skip_serializing_if = "String::is_empty")]
    pub subscription_id: String,

    /// Azure region
    #[serde(default)]
    pub location: String,

    /// Tags added to every Azure resource the cluster owns
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub additional_tags: Tags,

    /// Reference to the AzureClusterIdentity used for credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_ref: Option<ObjectReference>,

    /// Azure cloud environment
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub azure_environment: String,

    /// Cloud provider overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider_config_overrides: Option<CloudProviderConfigOverrides>,

    /// Network layout
    #[serde(default)]
    pub network_spec: NetworkSpec,

    /// Bastion host configuration
    #[serde(default)]
    pub bastion_spec: BastionSpec,
}
