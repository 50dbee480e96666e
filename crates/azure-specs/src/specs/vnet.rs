//! Virtual network spec

use std::any::Any;

use azure_crds::v1beta1::Tags;
use azure_crds::v1beta1::tags::COMMON_ROLE;
use tracing::debug;

use super::owned_tags;
use crate::error::SpecError;
use crate::models::{AddressSpace, VirtualNetwork, VirtualNetworkProperties};
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Desired state of the cluster virtual network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VNetSpec {
    /// Resource group of the vnet
    pub resource_group: String,
    /// Vnet name
    pub name: String,
    /// Address space
    pub cidrs: Vec<String>,
    /// Azure region
    pub location: String,
    /// Owning cluster, used for the ownership tag
    pub cluster_name: String,
    /// Extra tags merged with the ownership tags
    pub additional_tags: Tags,
}

impl ResourceSpecGetter for VNetSpec {
    type Parameters = VirtualNetwork;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<VirtualNetwork>, SpecError> {
        if existing_as::<VirtualNetwork>(existing)?.is_some() {
            debug!(vnet = %self.name, "virtual network exists, nothing to update");
            return Ok(None);
        }
        if self.cidrs.is_empty() {
            return Err(SpecError::MissingParameter(format!("CIDR blocks of vnet {}", self.name)));
        }

        Ok(Some(VirtualNetwork {
            location: self.location.clone(),
            tags: owned_tags(&self.cluster_name, &self.name, Some(COMMON_ROLE), &self.additional_tags),
            properties: VirtualNetworkProperties {
                address_space: AddressSpace {
                    address_prefixes: self.cidrs.clone(),
                },
                subnets: Vec::new(),
            },
        }))
    }
}
