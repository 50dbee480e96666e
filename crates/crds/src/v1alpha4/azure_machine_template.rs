//! AzureMachineTemplate CRD (v1alpha4)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::azure_machine::AzureMachineSpec;

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1alpha4",
    kind = "AzureMachineTemplate",
    namespaced,
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AzureMachineTemplateSpec {
    pub template: AzureMachineTemplateResource,
}

/// Template body; v1alpha4 templates carry no metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AzureMachineTemplateResource {
    pub spec: AzureMachineSpec,
}
