//! VM extension spec and the bootstrap-sentinel extension
//!
//! The bootstrap extension runs a command that waits for cloud-init (or
//! the Windows equivalent) to drop `/run/cluster-api/bootstrap-success.complete`,
//! so a failed bootstrap surfaces as a failed VM extension. The commands are
//! consumed verbatim by the extension handlers.

use std::any::Any;

use azure_crds::v1beta1::{AZURE_PUBLIC_CLOUD, OS_TYPE_LINUX, OS_TYPE_WINDOWS, Tags};
use serde_json::json;
use tracing::debug;

use crate::error::SpecError;
use crate::models::{VirtualMachineExtension, VirtualMachineExtensionProperties};
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Extension name on Linux VMs.
pub const LINUX_BOOTSTRAP_EXTENSION_NAME: &str = "CAPZ.Linux.Bootstrapping";
/// Extension name on Windows VMs.
pub const WINDOWS_BOOTSTRAP_EXTENSION_NAME: &str = "CAPZ.Windows.Bootstrapping";
/// Publisher of both bootstrap extensions.
pub const BOOTSTRAP_EXTENSION_PUBLISHER: &str = "Microsoft.Azure.ContainerUpstream";
/// Handler version of both bootstrap extensions.
pub const BOOTSTRAP_EXTENSION_VERSION: &str = "1.0";

/// Polls for the sentinel file for 20 minutes.
pub const LINUX_BOOTSTRAP_EXTENSION_COMMAND: &str = "for i in $(seq 1 1200); do if [ -f /run/cluster-api/bootstrap-success.complete ]; then exit 0; fi; sleep 1; done; exit 1";
/// Polls for the sentinel file for 5 minutes.
pub const WINDOWS_BOOTSTRAP_EXTENSION_COMMAND: &str = "powershell.exe -Command \"for ($i = 0; $i -lt 300; $i++) {if (Test-Path '/run/cluster-api/bootstrap-success.complete') {exit 0} else {Start-Sleep -Seconds 1}} exit -2\"";

/// Desired extension on a VM
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VMExtensionSpec {
    pub name: String,
    pub vm_name: String,
    pub resource_group: String,
    pub location: String,
    pub publisher: String,
    pub extension_type: String,
    pub version: String,
    /// Sent as protected `commandToExecute`
    pub command: String,
    pub additional_tags: Tags,
}

impl VMExtensionSpec {
    /// Bootstrap-sentinel extension for a VM running `os_type`.
    ///
    /// The extension handlers are published to the public cloud only, so
    /// other environments get `None`.
    pub fn bootstrap(
        os_type: &str,
        azure_environment: &str,
        vm_name: &str,
        resource_group: &str,
        location: &str,
    ) -> Option<Self> {
        if !azure_environment.is_empty() && azure_environment != AZURE_PUBLIC_CLOUD {
            debug!(vm = %vm_name, azure_environment, "bootstrap extension not available");
            return None;
        }
        let (name, extension_type, command) = match os_type {
            OS_TYPE_LINUX => (LINUX_BOOTSTRAP_EXTENSION_NAME, "linux-bootstrapping", LINUX_BOOTSTRAP_EXTENSION_COMMAND),
            OS_TYPE_WINDOWS => (
                WINDOWS_BOOTSTRAP_EXTENSION_NAME,
                "windows-bootstrapping",
                WINDOWS_BOOTSTRAP_EXTENSION_COMMAND,
            ),
            _ => return None,
        };
        Some(VMExtensionSpec {
            name: name.to_string(),
            vm_name: vm_name.to_string(),
            resource_group: resource_group.to_string(),
            location: location.to_string(),
            publisher: BOOTSTRAP_EXTENSION_PUBLISHER.to_string(),
            extension_type: extension_type.to_string(),
            version: BOOTSTRAP_EXTENSION_VERSION.to_string(),
            command: command.to_string(),
            additional_tags: Tags::new(),
        })
    }
}

impl ResourceSpecGetter for VMExtensionSpec {
    type Parameters = VirtualMachineExtension;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn owner_resource_name(&self) -> &str {
        &self.vm_name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<VirtualMachineExtension>, SpecError> {
        if existing_as::<VirtualMachineExtension>(existing)?.is_some() {
            return Ok(None);
        }
        Ok(Some(VirtualMachineExtension {
            location: self.location.clone(),
            tags: self.additional_tags.clone(),
            properties: VirtualMachineExtensionProperties {
                publisher: self.publisher.clone(),
                type_: self.extension_type.clone(),
                type_handler_version: self.version.clone(),
                settings: None,
                protected_settings: Some(json!({ "commandToExecute": self.command })),
            },
        }))
    }
}
