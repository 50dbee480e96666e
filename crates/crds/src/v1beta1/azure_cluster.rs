//! AzureCluster CRD (hub version)
//!
//! Describes the Azure infrastructure backing a workload cluster:
//! resource group, virtual network, subnets, load balancers and bastion.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::tags::Tags;
use super::types::{BastionSpec, CloudProviderConfigOverrides, NetworkSpec};
use crate::capi::{APIEndpoint, FailureDomainSpec, ObjectReference};

/// Azure public cloud.
pub const AZURE_PUBLIC_CLOUD: &str = "AzurePublicCloud";
/// Azure China cloud.
pub const AZURE_CHINA_CLOUD: &str = "AzureChinaCloud";
/// Azure Germany cloud.
pub const AZURE_GERMAN_CLOUD: &str = "AzureGermanCloud";
/// Azure US Government cloud.
pub const AZURE_US_GOVERNMENT_CLOUD: &str = "AzureUSGovernmentCloud";

/// Every supported cloud environment.
pub const SUPPORTED_CLOUD_ENVIRONMENTS: [&str; 4] = [
    AZURE_PUBLIC_CLOUD,
    AZURE_CHINA_CLOUD,
    AZURE_GERMAN_CLOUD,
    AZURE_US_GOVERNMENT_CLOUD,
];

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "AzureCluster",
    namespaced,
    status = "AzureClusterStatus",
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AzureClusterSpec {
    /// Azure subscription
    #[serde(default, rename = "subscriptionID", skip_serializing_if = "String::is_empty")]
    pub subscription_id: String,

    /// Azure region, e.g. `eastus`
    #[serde(default)]
    pub location: String,

    /// Tags added to every Azure resource the cluster owns
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub additional_tags: Tags,

    /// Reference to the AzureClusterIdentity used for credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_ref: Option<ObjectReference>,

    /// Azure cloud environment; defaults to `AzurePublicCloud`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub azure_environment: String,

    /// Cloud provider rate limit and backoff overrides, fixed at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider_config_overrides: Option<CloudProviderConfigOverrides>,

    /// Network layout
    #[serde(default)]
    pub network_spec: NetworkSpec,

    /// Resource group for cluster resources; defaults to the cluster name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group: String,

    /// Bastion host configuration
    #[serde(default)]
    pub bastion_spec: BastionSpec,

    /// Endpoint of the API server
    #[serde(default)]
    pub control_plane_endpoint: APIEndpoint,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureClusterStatus {
    /// Failure domains available in the region
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failure_domains: BTreeMap<String, FailureDomainSpec>,

    /// Infrastructure is ready
    #[serde(default)]
    pub ready: bool,
}
