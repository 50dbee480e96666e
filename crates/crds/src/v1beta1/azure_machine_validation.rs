//! AzureMachine and AzureMachineTemplate validation

use std::collections::HashSet;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kube::ResourceExt;
use ssh_key::AuthorizedKeys;
use tracing::debug;
use uuid::Uuid;

use super::azure_machine::{
    AzureMachine, AzureMachineSpec, DataDisk, Image, OSDisk, SUPPORTED_CACHING_TYPES, VMIdentity,
};
use super::azure_machine_template::AzureMachineTemplate;
use crate::GROUP;
use crate::error::ApiError;
use crate::field::{ErrorList, FieldError, FieldPath};
use crate::webhook::{Defaulter, Validator};

const IMMUTABLE: &str = "field is immutable";
const MAX_OS_DISK_SIZE_GB: i32 = 2048;
const MAX_DATA_DISK_SIZE_GB: i32 = 32767;
const MAX_LUN: i32 = 63;
const DIFF_DISK_OPTION_LOCAL: &str = "Local";

/// Rejection detail for any change to a machine template's spec.
pub const AZURE_MACHINE_TEMPLATE_IMMUTABLE_MSG: &str = "AzureMachineTemplate spec.template.spec field is immutable. Please create new resource instead. ref doc: https://cluster-api.sigs.k8s.io/tasks/updating-machine-templates.html";

impl Validator for AzureMachine {
    fn validate_create(&self) -> Result<(), ApiError> {
        let name = self.name_any();
        let errs = validate_machine_spec(&self.spec, &FieldPath::new("spec"), true);
        debug!("AzureMachine {} create validation found {} errors", name, errs.len());
        ApiError::check("AzureMachine", GROUP, &name, errs)
    }

    fn validate_update(&self, old: &Self) -> Result<(), ApiError> {
        let name = self.name_any();
        let errs = validate_machine_immutable(&self.spec, &old.spec);
        debug!("AzureMachine {} update validation found {} errors", name, errs.len());
        ApiError::check("AzureMachine", GROUP, &name, errs)
    }
}

impl Validator for AzureMachineTemplate {
    fn validate_create(&self) -> Result<(), ApiError> {
        let name = self.name_any();
        let path = FieldPath::new("spec").child("template").child("spec");
        let spec = &self.spec.template.spec;
        let mut errs = validate_machine_spec(spec, &path, false);
        if !spec.role_assignment_name.is_empty() {
            errs.push(FieldError::forbidden(
                &path.child("roleAssignmentName"),
                "RoleAssignmentName should not be set in the template",
            ));
        }
        debug!("AzureMachineTemplate {} create validation found {} errors", name, errs.len());
        ApiError::check("AzureMachineTemplate", GROUP, &name, errs)
    }

    fn validate_update(&self, old: &Self) -> Result<(), ApiError> {
        let name = self.name_any();
        let mut errs = ErrorList::new();

        // Templates stored before newer defaults existed compare as defaulted.
        let mut old = old.clone();
        old.set_defaults()?;
        if old.spec.template.spec != self.spec.template.spec {
            errs.push(FieldError::invalid(
                &FieldPath::new("AzureMachineTemplate").child("spec").child("template").child("spec"),
                &self.spec.template.spec,
                AZURE_MACHINE_TEMPLATE_IMMUTABLE_MSG,
            ));
        }
        ApiError::check("AzureMachineTemplate", GROUP, &name, errs)
    }
}

/// Structural rules on a machine spec.
///
/// `require_ssh_key` is false for templates, whose key may be filled per machine.
pub fn validate_machine_spec(spec: &AzureMachineSpec, path: &FieldPath, require_ssh_key: bool) -> ErrorList {
    let mut errs = ErrorList::new();

    if spec.vm_size.is_empty() {
        errs.push(FieldError::required(&path.child("vmSize"), "vmSize is required"));
    }
    if let Some(image) = &spec.image {
        errs.extend(validate_image(image, &path.child("image")));
    }
    if require_ssh_key || !spec.ssh_public_key.is_empty() {
        errs.extend(validate_ssh_key(&spec.ssh_public_key, &path.child("sshPublicKey")));
    }
    errs.extend(validate_identity(spec, path));
    errs.extend(validate_os_disk(&spec.os_disk, &path.child("osDisk")));
    errs.extend(validate_data_disks(&spec.data_disks, &path.child("dataDisks")));
    errs
}

/// Exactly one image source with its required fields.
pub fn validate_image(image: &Image, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    let sources = usize::from(image.id.is_some())
        + usize::from(image.marketplace.is_some())
        + usize::from(image.shared_gallery.is_some());
    match sources {
        0 => {
            errs.push(FieldError::required(
                path,
                "You must supply an ID, Marketplace or SharedGallery image details",
            ));
            return errs;
        }
        1 => {}
        _ => {
            errs.push(FieldError::forbidden(
                path,
                "You must supply only one of ID, Marketplace or SharedGallery image details",
            ));
            return errs;
        }
    }

    if let Some(id) = &image.id {
        if id.is_empty() {
            errs.push(FieldError::required(&path.child("id"), "ID must be set"));
        }
    }
    if let Some(marketplace) = &image.marketplace {
        let marketplace_path = path.child("marketplace");
        let required = [
            ("publisher", &marketplace.publisher),
            ("offer", &marketplace.offer),
            ("sku", &marketplace.sku),
            ("version", &marketplace.version),
        ];
        for (field, value) in required {
            if value.is_empty() {
                errs.push(FieldError::required(&marketplace_path.child(field), format!("{field} must be set")));
            }
        }
    }
    if let Some(gallery) = &image.shared_gallery {
        let gallery_path = path.child("sharedGallery");
        let required = [
            ("subscriptionID", &gallery.subscription_id),
            ("resourceGroup", &gallery.resource_group),
            ("gallery", &gallery.gallery),
            ("name", &gallery.name),
            ("version", &gallery.version),
        ];
        for (field, value) in required {
            if value.is_empty() {
                errs.push(FieldError::required(&gallery_path.child(field), format!("{field} must be set")));
            }
        }
    }
    errs
}

/// The key must be base64 of an authorized-keys line.
pub fn validate_ssh_key(encoded: &str, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    let Ok(decoded) = STANDARD.decode(encoded) else {
        errs.push(FieldError::required(path, "the SSH public key is not properly base64 encoded"));
        return errs;
    };
    let parsed = String::from_utf8(decoded)
        .ok()
        .and_then(|line| parse_authorized_key(&line));
    if parsed.is_none() {
        errs.push(FieldError::required(path, "the SSH public key is not valid"));
    }
    errs
}

/// Key type of the first key in an authorized-keys document.
///
/// Accepts an options prefix and trailing comment; the key blob must decode
/// to a key of the type it is labelled with.
pub fn parse_authorized_key(text: &str) -> Option<String> {
    let entry = AuthorizedKeys::new(text).next()?.ok()?;
    Some(entry.public_key().algorithm().as_str().to_string())
}

fn validate_identity(spec: &AzureMachineSpec, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    match spec.identity {
        VMIdentity::UserAssigned if spec.user_assigned_identities.is_empty() => {
            errs.push(FieldError::required(
                &path.child("userAssignedIdentities"),
                "must be specified for the 'UserAssigned' identity type",
            ));
        }
        VMIdentity::SystemAssigned
            if !spec.role_assignment_name.is_empty() && Uuid::parse_str(&spec.role_assignment_name).is_err() =>
        {
            errs.push(FieldError::invalid(
                &path.child("roleAssignmentName"),
                &spec.role_assignment_name,
                "Role assignment name must be a valid GUID. It is optional and will be auto-generated when not specified.",
            ));
        }
        VMIdentity::None | VMIdentity::SystemAssigned if !spec.user_assigned_identities.is_empty() => {
            errs.push(FieldError::forbidden(
                &path.child("userAssignedIdentities"),
                format!("cannot be set for the '{}' identity type", spec.identity.as_str()),
            ));
        }
        _ => {}
    }
    errs
}

/// OS disk type, size and caching.
pub fn validate_os_disk(disk: &OSDisk, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if disk.os_type.is_empty() {
        errs.push(FieldError::required(&path.child("osType"), "the OS type cannot be empty"));
    }
    if let Some(size) = disk.disk_size_gb {
        if size <= 0 || size > MAX_OS_DISK_SIZE_GB {
            errs.push(FieldError::invalid(
                &path.child("diskSizeGB"),
                &size,
                format!("the Disk size should be a value between 1 and {MAX_OS_DISK_SIZE_GB}"),
            ));
        }
    }
    if !disk.caching_type.is_empty() && !SUPPORTED_CACHING_TYPES.contains(&disk.caching_type.as_str()) {
        errs.push(FieldError::not_supported(
            &path.child("cachingType"),
            &disk.caching_type,
            &SUPPORTED_CACHING_TYPES,
        ));
    }
    if let Some(settings) = &disk.diff_disk_settings {
        if settings.option != DIFF_DISK_OPTION_LOCAL {
            errs.push(FieldError::not_supported(
                &path.child("diffDiskSettings").child("option"),
                &settings.option,
                &[DIFF_DISK_OPTION_LOCAL],
            ));
        }
    }
    errs
}

/// Data disk suffixes, sizes, LUNs and caching.
pub fn validate_data_disks(disks: &[DataDisk], path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    let mut suffixes = HashSet::new();
    let mut luns = HashSet::new();

    for (i, disk) in disks.iter().enumerate() {
        let disk_path = path.index(i);
        if disk.name_suffix.is_empty() {
            errs.push(FieldError::required(&disk_path.child("nameSuffix"), "the name suffix cannot be empty"));
        } else if !suffixes.insert(disk.name_suffix.as_str()) {
            errs.push(FieldError::duplicate(&disk_path.child("nameSuffix"), &disk.name_suffix));
        }
        if disk.disk_size_gb <= 0 || disk.disk_size_gb > MAX_DATA_DISK_SIZE_GB {
            errs.push(FieldError::invalid(
                &disk_path.child("diskSizeGB"),
                &disk.disk_size_gb,
                format!("the disk size should be a value between 1 and {MAX_DATA_DISK_SIZE_GB}"),
            ));
        }
        if let Some(lun) = disk.lun {
            if !(0..=MAX_LUN).contains(&lun) {
                errs.push(FieldError::invalid(
                    &disk_path.child("lun"),
                    &lun,
                    format!("logical unit number must be between 0 and {MAX_LUN}"),
                ));
            } else if !luns.insert(lun) {
                errs.push(FieldError::duplicate(&disk_path.child("lun"), &lun));
            }
        }
        if !disk.caching_type.is_empty() && !SUPPORTED_CACHING_TYPES.contains(&disk.caching_type.as_str()) {
            errs.push(FieldError::not_supported(
                &disk_path.child("cachingType"),
                &disk.caching_type,
                &SUPPORTED_CACHING_TYPES,
            ));
        }
    }
    errs
}

/// Machine fields fixed after creation.
pub fn validate_machine_immutable(new: &AzureMachineSpec, old: &AzureMachineSpec) -> ErrorList {
    let spec = FieldPath::new("spec");
    let mut errs = ErrorList::new();
    let mut check = |field: &str, changed: bool, value: serde_json::Value| {
        if changed {
            errs.push(FieldError::invalid(&spec.child(field), &value, IMMUTABLE));
        }
    };

    check("Image", old.image != new.image, to_value(&new.image));
    check("Identity", old.identity != new.identity, to_value(&new.identity));
    check(
        "UserAssignedIdentities",
        old.user_assigned_identities != new.user_assigned_identities,
        to_value(&new.user_assigned_identities),
    );
    check(
        "RoleAssignmentName",
        old.role_assignment_name != new.role_assignment_name,
        to_value(&new.role_assignment_name),
    );
    check("OSDisk", old.os_disk != new.os_disk, to_value(&new.os_disk));
    check("DataDisks", old.data_disks != new.data_disks, to_value(&new.data_disks));
    check("SSHPublicKey", old.ssh_public_key != new.ssh_public_key, to_value(&new.ssh_public_key));
    check("AllocatePublicIP", old.allocate_public_ip != new.allocate_public_ip, to_value(&new.allocate_public_ip));
    check(
        "EnableIPForwarding",
        old.enable_ip_forwarding != new.enable_ip_forwarding,
        to_value(&new.enable_ip_forwarding),
    );
    check(
        "AcceleratedNetworking",
        old.accelerated_networking != new.accelerated_networking,
        to_value(&new.accelerated_networking),
    );
    check("SpotVMOptions", old.spot_vm_options != new.spot_vm_options, to_value(&new.spot_vm_options));
    check("SecurityProfile", old.security_profile != new.security_profile, to_value(&new.security_profile));
    errs
}

fn to_value<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_default()
}
