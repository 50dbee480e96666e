//! AzureMachineTemplate CRD (v1alpha3)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::azure_machine::AzureMachineSpec;

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1alpha3",
    kind = "AzureMachineTemplate",
    namespaced,
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AzureMachineTemplateSpec {
    pub template: AzureMachineTemplateResource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AzureMachineTemplateResource {
    pub spec: AzureMachineSpec,
}
