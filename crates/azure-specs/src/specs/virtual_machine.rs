//! Virtual machine spec
//!
//! VMs are never updated in place: once a VM exists `parameters` returns
//! `None` and changes go through machine replacement.

use std::any::Any;
use std::collections::BTreeMap;

use azure_crds::v1beta1::{self, OS_TYPE_WINDOWS, Tags, VMIdentity};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use rand::distributions::Alphanumeric;

use super::owned_tags;
use crate::error::SpecError;
use crate::ids::{self, PROVIDER_ID_PREFIX};
use crate::models::{
    BillingProfile, BootDiagnostics, DataDisk, DiagnosticsProfile, DiffDiskSettings, HardwareProfile,
    ImageReference, LinuxConfiguration, ManagedDisk, NetworkInterfaceReference,
    NetworkInterfaceReferenceProperties, NetworkProfile, OsDisk, OsProfile, Plan, SshConfiguration,
    SshPublicKey, StorageProfile, SubResource, VirtualMachine, VirtualMachineIdentity,
    VirtualMachineProperties, VmAdditionalCapabilities, VmSecurityProfile, WindowsConfiguration,
};
use crate::names::{data_disk_name, os_disk_name};
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Admin user created on every VM.
pub const ADMIN_USERNAME: &str = "capi";
/// Spot VMs are deallocated, not deleted, on eviction.
pub const SPOT_EVICTION_POLICY: &str = "Deallocate";
const WINDOWS_PASSWORD_LENGTH: usize = 123;

/// Desired state of a machine's VM
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VMSpec {
    pub name: String,
    pub resource_group: String,
    pub subscription_id: String,
    pub location: String,
    pub role: String,
    /// First one is primary
    pub nic_names: Vec<String>,
    /// Base64, as stored on the machine
    pub ssh_public_key: String,
    pub size: String,
    pub os_disk: v1beta1::OSDisk,
    pub data_disks: Vec<v1beta1::DataDisk>,
    pub image: Option<v1beta1::Image>,
    pub availability_set_name: Option<String>,
    pub zone: Option<String>,
    pub identity: VMIdentity,
    pub user_assigned_identities: Vec<v1beta1::UserAssignedIdentity>,
    pub spot_vm_options: Option<v1beta1::SpotVMOptions>,
    pub security_profile: Option<v1beta1::SecurityProfile>,
    pub additional_capabilities: Option<v1beta1::AdditionalCapabilities>,
    pub bootstrap_data: String,
    pub cluster_name: String,
    pub additional_tags: Tags,
}

fn managed_disk(params: &v1beta1::ManagedDiskParameters) -> ManagedDisk {
    ManagedDisk {
        storage_account_type: params.storage_account_type.clone(),
        disk_encryption_set: params
            .disk_encryption_set
            .as_ref()
            .map(|set| SubResource::new(set.id.clone())),
    }
}

fn caching(caching_type: &str) -> Option<String> {
    (!caching_type.is_empty()).then(|| caching_type.to_string())
}

/// Image reference and, for paid images, the purchase plan.
fn image_reference(image: &v1beta1::Image) -> Result<(ImageReference, Option<Plan>), SpecError> {
    if let Some(id) = &image.id {
        let reference = ImageReference {
            id: Some(id.clone()),
            ..Default::default()
        };
        return Ok((reference, None));
    }
    if let Some(gallery) = &image.shared_gallery {
        let reference = ImageReference {
            id: Some(ids::shared_gallery_image_id(
                &gallery.subscription_id,
                &gallery.resource_group,
                &gallery.gallery,
                &gallery.name,
                &gallery.version,
            )),
            ..Default::default()
        };
        let plan = match (&gallery.publisher, &gallery.offer, &gallery.sku) {
            (Some(publisher), Some(offer), Some(sku)) => Some(Plan {
                name: sku.clone(),
                publisher: publisher.clone(),
                product: offer.clone(),
            }),
            _ => None,
        };
        return Ok((reference, plan));
    }
    if let Some(marketplace) = &image.marketplace {
        let reference = ImageReference {
            id: None,
            publisher: Some(marketplace.publisher.clone()),
            offer: Some(marketplace.offer.clone()),
            sku: Some(marketplace.sku.clone()),
            version: Some(marketplace.version.clone()),
        };
        let plan = marketplace.third_party_image.then(|| Plan {
            name: marketplace.sku.clone(),
            publisher: marketplace.publisher.clone(),
            product: marketplace.offer.clone(),
        });
        return Ok((reference, plan));
    }
    Err(SpecError::MissingParameter("image source".to_string()))
}

fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(WINDOWS_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

impl VMSpec {
    fn is_windows(&self) -> bool {
        self.os_disk.os_type == OS_TYPE_WINDOWS
    }

    fn storage_profile(&self) -> Result<(StorageProfile, Option<Plan>), SpecError> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| SpecError::MissingParameter(format!("image of VM {}", self.name)))?;
        let (image_reference, plan) = image_reference(image)?;

        let os_disk = OsDisk {
            name: os_disk_name(&self.name),
            os_type: self.os_disk.os_type.clone(),
            create_option: "FromImage".to_string(),
            disk_size_gb: self.os_disk.disk_size_gb,
            caching: caching(&self.os_disk.caching_type),
            managed_disk: self.os_disk.managed_disk.as_ref().map(managed_disk),
            diff_disk_settings: self.os_disk.diff_disk_settings.as_ref().map(|d| DiffDiskSettings {
                option: d.option.clone(),
            }),
        };

        let data_disks = self
            .data_disks
            .iter()
            .map(|disk| {
                let lun = disk.lun.ok_or_else(|| {
                    SpecError::MissingParameter(format!("LUN of data disk {}", disk.name_suffix))
                })?;
                Ok(DataDisk {
                    name: data_disk_name(&self.name, &disk.name_suffix),
                    lun,
                    create_option: "Empty".to_string(),
                    disk_size_gb: disk.disk_size_gb,
                    caching: caching(&disk.caching_type),
                    managed_disk: disk.managed_disk.as_ref().map(managed_disk),
                })
            })
            .collect::<Result<Vec<_>, SpecError>>()?;

        Ok((
            StorageProfile {
                image_reference,
                os_disk,
                data_disks,
            },
            plan,
        ))
    }

    fn os_profile(&self) -> Result<OsProfile, SpecError> {
        if self.bootstrap_data.is_empty() {
            return Err(SpecError::MissingParameter(format!("bootstrap data of VM {}", self.name)));
        }
        let mut profile = OsProfile {
            computer_name: self.name.clone(),
            admin_username: ADMIN_USERNAME.to_string(),
            admin_password: None,
            custom_data: STANDARD.encode(&self.bootstrap_data),
            linux_configuration: None,
            windows_configuration: None,
        };

        if self.is_windows() {
            profile.admin_password = Some(random_password());
            profile.windows_configuration = Some(WindowsConfiguration {
                enable_automatic_updates: false,
            });
            return Ok(profile);
        }

        let decoded = STANDARD
            .decode(&self.ssh_public_key)
            .map_err(|e| SpecError::Encoding(format!("SSH public key of VM {}: {e}", self.name)))?;
        let key_data = String::from_utf8(decoded)
            .map_err(|e| SpecError::Encoding(format!("SSH public key of VM {}: {e}", self.name)))?;
        if key_data.trim().is_empty() {
            return Err(SpecError::MissingParameter(format!("SSH public key of VM {}", self.name)));
        }
        profile.linux_configuration = Some(LinuxConfiguration {
            disable_password_authentication: true,
            ssh: SshConfiguration {
                public_keys: vec![SshPublicKey {
                    path: format!("/home/{ADMIN_USERNAME}/.ssh/authorized_keys"),
                    key_data,
                }],
            },
        });
        Ok(profile)
    }

    fn identity(&self) -> Result<Option<VirtualMachineIdentity>, SpecError> {
        match self.identity {
            VMIdentity::None => Ok(None),
            VMIdentity::SystemAssigned => Ok(Some(VirtualMachineIdentity {
                type_: VMIdentity::SystemAssigned.as_str().to_string(),
                user_assigned_identities: BTreeMap::new(),
            })),
            VMIdentity::UserAssigned => {
                if self.user_assigned_identities.is_empty() {
                    return Err(SpecError::MissingParameter(format!(
                        "user assigned identities of VM {}",
                        self.name
                    )));
                }
                let identities = self
                    .user_assigned_identities
                    .iter()
                    .map(|identity| {
                        let id = identity
                            .provider_id
                            .strip_prefix(PROVIDER_ID_PREFIX)
                            .unwrap_or(&identity.provider_id);
                        (id.to_string(), serde_json::json!({}))
                    })
                    .collect();
                Ok(Some(VirtualMachineIdentity {
                    type_: VMIdentity::UserAssigned.as_str().to_string(),
                    user_assigned_identities: identities,
                }))
            }
        }
    }

    fn spot_settings(&self) -> Result<(Option<String>, Option<String>, Option<BillingProfile>), SpecError> {
        let Some(spot) = &self.spot_vm_options else {
            return Ok((None, None, None));
        };
        let max_price = match &spot.max_price {
            Some(price) => price
                .parse::<f64>()
                .map_err(|e| SpecError::InvalidParameter(format!("spot max price {price:?}: {e}")))?,
            None => -1.0,
        };
        Ok((
            Some("Spot".to_string()),
            Some(SPOT_EVICTION_POLICY.to_string()),
            Some(BillingProfile { max_price }),
        ))
    }
}

impl ResourceSpecGetter for VMSpec {
    type Parameters = VirtualMachine;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<VirtualMachine>, SpecError> {
        if existing_as::<VirtualMachine>(existing)?.is_some() {
            return Ok(None);
        }
        if self.nic_names.is_empty() {
            return Err(SpecError::MissingParameter(format!("network interfaces of VM {}", self.name)));
        }

        let (storage_profile, plan) = self.storage_profile()?;
        let (priority, eviction_policy, billing_profile) = self.spot_settings()?;
        let network_interfaces = self
            .nic_names
            .iter()
            .enumerate()
            .map(|(i, nic)| NetworkInterfaceReference {
                id: ids::network_interface_id(&self.subscription_id, &self.resource_group, nic),
                properties: NetworkInterfaceReferenceProperties { primary: i == 0 },
            })
            .collect();

        Ok(Some(VirtualMachine {
            location: self.location.clone(),
            tags: owned_tags(&self.cluster_name, &self.name, Some(&self.role), &self.additional_tags),
            zones: self.zone.iter().cloned().collect(),
            identity: self.identity()?,
            plan,
            properties: VirtualMachineProperties {
                hardware_profile: HardwareProfile {
                    vm_size: self.size.clone(),
                },
                storage_profile,
                os_profile: self.os_profile()?,
                network_profile: NetworkProfile { network_interfaces },
                availability_set: self.availability_set_name.as_ref().map(|set| {
                    SubResource::new(ids::availability_set_id(&self.subscription_id, &self.resource_group, set))
                }),
                priority,
                eviction_policy,
                billing_profile,
                security_profile: self.security_profile.as_ref().map(|p| VmSecurityProfile {
                    encryption_at_host: p.encryption_at_host,
                }),
                additional_capabilities: self.additional_capabilities.as_ref().map(|c| VmAdditionalCapabilities {
                    ultra_ssd_enabled: c.ultra_ssd_enabled,
                }),
                diagnostics_profile: DiagnosticsProfile {
                    boot_diagnostics: BootDiagnostics { enabled: true },
                },
            },
        }))
    }
}
