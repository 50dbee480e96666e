//! AzureMachineTemplate CRD (hub version)
//!
//! Immutable machine spec snapshot that machine sets and control planes
//! stamp out AzureMachines from.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::azure_machine::AzureMachineSpec;
use crate::capi::ObjectMeta;

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "AzureMachineTemplate",
    namespaced,
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AzureMachineTemplateSpec {
    /// Template for new AzureMachines
    pub template: AzureMachineTemplateResource,
}

/// Machine template body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AzureMachineTemplateResource {
    /// Labels and annotations for created machines
    #[serde(default, skip_serializing_if = "ObjectMeta::is_empty")]
    pub metadata: ObjectMeta,

    /// Machine spec
    pub spec: AzureMachineSpec,
}
