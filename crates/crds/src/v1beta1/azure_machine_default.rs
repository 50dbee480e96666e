//! AzureMachine and AzureMachineTemplate defaulting

use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kube::ResourceExt;
use rsa::RsaPrivateKey;
use ssh_key::PublicKey;
use ssh_key::public::{KeyData, RsaPublicKey};
use tracing::debug;
use uuid::Uuid;

use super::azure_machine::{
    AzureMachine, AzureMachineSpec, CACHING_TYPE_NONE, CACHING_TYPE_READ_WRITE, VMIdentity,
};
use super::azure_machine_template::AzureMachineTemplate;
use crate::error::ApiError;
use crate::webhook::Defaulter;

const SSH_KEY_BITS: usize = 2048;

impl Defaulter for AzureMachine {
    fn set_defaults(&mut self) -> Result<(), ApiError> {
        debug!("Defaulting AzureMachine {}", self.name_any());
        self.spec.set_ssh_key_defaults()?;
        self.spec.set_disk_defaults();
        self.spec.set_identity_defaults();
        Ok(())
    }
}

impl Defaulter for AzureMachineTemplate {
    fn set_defaults(&mut self) -> Result<(), ApiError> {
        debug!("Defaulting AzureMachineTemplate {}", self.name_any());
        self.spec.template.spec.set_disk_defaults();
        Ok(())
    }
}

impl AzureMachineSpec {
    /// Generates an SSH key when none was supplied.
    pub fn set_ssh_key_defaults(&mut self) -> Result<(), ApiError> {
        if self.ssh_public_key.is_empty() {
            debug!("Generating SSH public key");
            self.ssh_public_key = generate_ssh_public_key()?;
        }
        Ok(())
    }

    /// OS disk caching, data disk LUNs and caching.
    pub fn set_disk_defaults(&mut self) {
        if self.os_disk.caching_type.is_empty() {
            self.os_disk.caching_type = CACHING_TYPE_NONE.to_string();
        }

        let mut used: BTreeSet<i32> = self.data_disks.iter().filter_map(|d| d.lun).collect();
        for disk in &mut self.data_disks {
            if disk.lun.is_none() {
                let lun = (0..).find(|lun| !used.contains(lun)).unwrap_or_default();
                used.insert(lun);
                disk.lun = Some(lun);
            }
            if disk.caching_type.is_empty() {
                disk.caching_type = CACHING_TYPE_READ_WRITE.to_string();
            }
        }
    }

    /// Role assignment name for system-assigned identities.
    pub fn set_identity_defaults(&mut self) {
        if self.identity == VMIdentity::SystemAssigned && self.role_assignment_name.is_empty() {
            self.role_assignment_name = Uuid::new_v4().to_string();
        }
    }
}

/// Base64 of a fresh RSA key in authorized-keys form.
pub fn generate_ssh_public_key() -> Result<String, ApiError> {
    let key = RsaPrivateKey::new(&mut rand::thread_rng(), SSH_KEY_BITS)
        .map_err(|e| ApiError::KeyGeneration(e.to_string()))?;
    let key_data = RsaPublicKey::try_from(&key.to_public_key())
        .map_err(|e| ApiError::KeyGeneration(e.to_string()))?;
    let line = PublicKey::new(KeyData::Rsa(key_data), "")
        .to_openssh()
        .map_err(|e| ApiError::KeyGeneration(e.to_string()))?;
    Ok(STANDARD.encode(format!("{line}\n")))
}
