//! NAT gateway spec

use std::any::Any;

use azure_crds::v1beta1::{SKU_STANDARD, Tags};
use tracing::debug;

use super::{owned_tags, same_id};
use crate::error::SpecError;
use crate::ids;
use crate::models::{NatGateway, NatGatewayProperties, Sku, SubResource};
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Desired state of a NAT gateway and the public IP it egresses through
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NatGatewaySpec {
    /// NAT gateway name
    pub name: String,
    /// Cluster resource group
    pub resource_group: String,
    /// Subscription of the public IP
    pub subscription_id: String,
    /// Azure region
    pub location: String,
    /// Public IP attached to the gateway
    pub public_ip_name: String,
    /// Owning cluster, used for the ownership tag
    pub cluster_name: String,
    /// Extra tags merged with the ownership tags
    pub additional_tags: Tags,
}

impl ResourceSpecGetter for NatGatewaySpec {
    type Parameters = NatGateway;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<NatGateway>, SpecError> {
        if self.public_ip_name.is_empty() {
            return Err(SpecError::MissingParameter(format!("public IP of NAT gateway {}", self.name)));
        }
        let ip_id = ids::public_ip_id(&self.subscription_id, &self.resource_group, &self.public_ip_name);

        if let Some(existing) = existing_as::<NatGateway>(existing)? {
            let attached = existing
                .properties
                .public_ip_addresses
                .iter()
                .any(|ip| same_id(&ip.id, &ip_id));
            if attached {
                debug!(natgw = %self.name, "NAT gateway already uses its public IP");
                return Ok(None);
            }
        }

        Ok(Some(NatGateway {
            location: self.location.clone(),
            tags: owned_tags(&self.cluster_name, &self.name, None, &self.additional_tags),
            sku: Sku::new(SKU_STANDARD),
            properties: NatGatewayProperties {
                public_ip_addresses: vec![SubResource::new(ip_id)],
            },
        }))
    }
}
