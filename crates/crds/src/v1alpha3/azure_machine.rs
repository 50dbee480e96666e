//! AzureMachine CRD (v1alpha3)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::v1alpha4::Image;
use crate::v1beta1::{
    AzureMachineStatus, ManagedDiskParameters, OSDisk, SpotVMOptions, Tags, UserAssignedIdentity,
    VMIdentity,
};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1alpha3",
    kind = "AzureMachine",
    namespaced,
    status = "AzureMachineStatus",
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AzureMachineSpec {
    #[serde(default, rename = "providerID", skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    #[serde(default)]
    pub vm_size: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,

    #[serde(default)]
    pub identity: VMIdentity,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_assigned_identities: Vec<UserAssignedIdentity>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role_assignment_name: String,

    #[serde(default)]
    pub os_disk: OSDisk,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_disks: Vec<DataDisk>,

    #[serde(default)]
    pub ssh_public_key: String,

    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub additional_tags: Tags,

    #[serde(default, rename = "allocatePublicIP", skip_serializing_if = "std::ops::Not::not")]
    pub allocate_public_ip: bool,

    #[serde(default, rename = "enableIPForwarding", skip_serializing_if = "std::ops::Not::not")]
    pub enable_ip_forwarding: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerated_networking: Option<bool>,

    #[serde(default, rename = "spotVMOptions", skip_serializing_if = "Option::is_none")]
    pub spot_vm_options: Option<SpotVMOptions>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subnet_name: String,
}

/// Data disk without a caching type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    pub name_suffix: String,

    #[serde(default, rename = "diskSizeGB")]
    pub disk_size_gb: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_disk: Option<ManagedDiskParameters>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lun: Option<i32>,
}
