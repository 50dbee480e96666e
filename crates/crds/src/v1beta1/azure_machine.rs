//! AzureMachine CRD (hub version)
//!
//! Describes a single Azure virtual machine: size, image, disks,
//! identity and networking toggles.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::tags::Tags;
use crate::capi::MachineAddress;

/// Disk caching: none.
pub const CACHING_TYPE_NONE: &str = "None";
/// Disk caching: read only.
pub const CACHING_TYPE_READ_ONLY: &str = "ReadOnly";
/// Disk caching: read/write.
pub const CACHING_TYPE_READ_WRITE: &str = "ReadWrite";
/// Every supported caching type.
pub const SUPPORTED_CACHING_TYPES: [&str; 3] =
    [CACHING_TYPE_NONE, CACHING_TYPE_READ_ONLY, CACHING_TYPE_READ_WRITE];

/// Linux OS type.
pub const OS_TYPE_LINUX: &str = "Linux";
/// Windows OS type.
pub const OS_TYPE_WINDOWS: &str = "Windows";

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "AzureMachine",
    namespaced,
    status = "AzureMachineStatus",
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AzureMachineSpec {
    /// `azure://` provider ID, set once the VM exists
    #[serde(default, rename = "providerID", skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    /// VM size, e.g. `Standard_D2s_v3`
    #[serde(default)]
    pub vm_size: String,

    /// Availability zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_domain: Option<String>,

    /// OS image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,

    /// Managed identity assigned to the VM
    #[serde(default)]
    pub identity: VMIdentity,

    /// User-assigned identities, required with `UserAssigned`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_assigned_identities: Vec<UserAssignedIdentity>,

    /// Role assignment name for `SystemAssigned` identities
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role_assignment_name: String,

    /// OS disk
    #[serde(default)]
    pub os_disk: OSDisk,

    /// Data disks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_disks: Vec<DataDisk>,

    /// Base64-encoded OpenSSH public key
    #[serde(default)]
    pub ssh_public_key: String,

    /// Tags added to the VM and its resources
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub additional_tags: Tags,

    /// Optional VM capabilities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_capabilities: Option<AdditionalCapabilities>,

    /// Attach a public IP to the NIC
    #[serde(default, rename = "allocatePublicIP", skip_serializing_if = "std::ops::Not::not")]
    pub allocate_public_ip: bool,

    /// Enable IP forwarding on the NIC
    #[serde(default, rename = "enableIPForwarding", skip_serializing_if = "std::ops::Not::not")]
    pub enable_ip_forwarding: bool,

    /// Accelerated networking; unset lets the VM size decide
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerated_networking: Option<bool>,

    /// Spot VM settings
    #[serde(default, rename = "spotVMOptions", skip_serializing_if = "Option::is_none")]
    pub spot_vm_options: Option<SpotVMOptions>,

    /// Security settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_profile: Option<SecurityProfile>,

    /// Subnet for the NIC; defaults to the role subnet
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subnet_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureMachineStatus {
    /// VM is provisioned
    #[serde(default)]
    pub ready: bool,

    /// Addresses assigned to the VM
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<MachineAddress>,

    /// Provisioning state reported by Azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_state: Option<String>,

    /// Terminal failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// Terminal failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
}

/// Managed identity type of a VM.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum VMIdentity {
    /// No managed identity
    #[default]
    None,
    /// System-assigned identity
    SystemAssigned,
    /// One or more user-assigned identities
    UserAssigned,
}

impl VMIdentity {
    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            VMIdentity::None => "None",
            VMIdentity::SystemAssigned => "SystemAssigned",
            VMIdentity::UserAssigned => "UserAssigned",
        }
    }
}

/// A user-assigned identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UserAssignedIdentity {
    /// `azure://` ID of the identity
    #[serde(rename = "providerID")]
    pub provider_id: String,
}

/// VM image; exactly one source must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// ARM ID of a custom image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Shared Image Gallery image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_gallery: Option<AzureSharedGalleryImage>,

    /// Marketplace image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<AzureMarketplaceImage>,
}

/// Image in a Shared Image Gallery.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AzureSharedGalleryImage {
    /// Subscription holding the gallery
    #[serde(default, rename = "subscriptionID")]
    pub subscription_id: String,

    /// Resource group holding the gallery
    #[serde(default)]
    pub resource_group: String,

    /// Gallery name
    #[serde(default)]
    pub gallery: String,

    /// Image definition name
    #[serde(default)]
    pub name: String,

    /// Image version
    #[serde(default)]
    pub version: String,

    /// Purchase plan publisher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    /// Purchase plan offer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,

    /// Purchase plan SKU
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

/// Azure Marketplace image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AzureMarketplaceImage {
    /// Image publisher
    #[serde(default)]
    pub publisher: String,

    /// Image offer
    #[serde(default)]
    pub offer: String,

    /// Image SKU
    #[serde(default)]
    pub sku: String,

    /// Image version
    #[serde(default)]
    pub version: String,

    /// Image requires a purchase plan
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub third_party_image: bool,
}

/// OS disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OSDisk {
    /// `Linux` or `Windows`
    #[serde(default)]
    pub os_type: String,

    /// Size in GB
    #[serde(default, rename = "diskSizeGB", skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<i32>,

    /// Managed disk parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_disk: Option<ManagedDiskParameters>,

    /// Ephemeral OS disk settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_disk_settings: Option<DiffDiskSettings>,

    /// `None`, `ReadOnly` or `ReadWrite`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub caching_type: String,
}

/// Data disk attached to a VM.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    /// Suffix appended to the VM name to form the disk name
    pub name_suffix: String,

    /// Size in GB
    #[serde(default, rename = "diskSizeGB")]
    pub disk_size_gb: i32,

    /// Managed disk parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_disk: Option<ManagedDiskParameters>,

    /// Logical unit number, unique per VM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lun: Option<i32>,

    /// `None`, `ReadOnly` or `ReadWrite`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub caching_type: String,
}

/// Managed disk settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDiskParameters {
    /// Storage account type, e.g. `Premium_LRS`
    #[serde(default)]
    pub storage_account_type: String,

    /// Disk encryption set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_encryption_set: Option<DiskEncryptionSetParameters>,
}

/// Disk encryption set reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DiskEncryptionSetParameters {
    /// ARM ID of the encryption set
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
}

/// Ephemeral OS disk settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DiffDiskSettings {
    /// Placement, only `Local` is supported
    pub option: String,
}

/// Spot VM settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpotVMOptions {
    /// Maximum hourly price as a quantity string; unset means on-demand price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<String>,
}

/// VM security settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityProfile {
    /// Host-based encryption of disks and caches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_at_host: Option<bool>,
}

/// Optional VM capabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalCapabilities {
    /// Allow UltraSSD data disks
    #[serde(default, rename = "ultraSSDEnabled", skip_serializing_if = "Option::is_none")]
    pub ultra_ssd_enabled: Option<bool>,
}
