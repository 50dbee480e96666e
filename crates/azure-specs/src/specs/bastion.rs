//! Azure Bastion host spec

use std::any::Any;

use azure_crds::v1beta1::Tags;
use azure_crds::v1beta1::tags::BASTION_ROLE;

use super::owned_tags;
use crate::error::SpecError;
use crate::ids;
use crate::models::{
    BastionHost, BastionHostProperties, BastionIPConfiguration, BastionIPConfigurationProperties, SubResource,
};
use crate::names::BASTION_IP_CONFIG_NAME;
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Desired bastion host of a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BastionSpec {
    pub name: String,
    pub resource_group: String,
    pub subscription_id: String,
    pub location: String,
    pub subnet_name: String,
    pub vnet_name: String,
    pub vnet_resource_group: String,
    pub public_ip_name: String,
    pub cluster_name: String,
    pub additional_tags: Tags,
}

impl ResourceSpecGetter for BastionSpec {
    type Parameters = BastionHost;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<BastionHost>, SpecError> {
        if existing_as::<BastionHost>(existing)?.is_some() {
            return Ok(None);
        }
        Ok(Some(BastionHost {
            location: self.location.clone(),
            tags: owned_tags(&self.cluster_name, &self.name, Some(BASTION_ROLE), &self.additional_tags),
            properties: BastionHostProperties {
                dns_name: Some(format!("{}-bastion", self.name.to_lowercase())),
                ip_configurations: vec![BastionIPConfiguration {
                    name: BASTION_IP_CONFIG_NAME.to_string(),
                    properties: BastionIPConfigurationProperties {
                        subnet: SubResource::new(ids::subnet_id(
                            &self.subscription_id,
                            &self.vnet_resource_group,
                            &self.vnet_name,
                            &self.subnet_name,
                        )),
                        public_ip_address: SubResource::new(ids::public_ip_id(
                            &self.subscription_id,
                            &self.resource_group,
                            &self.public_ip_name,
                        )),
                        private_ip_allocation_method: "Dynamic".to_string(),
                    },
                }],
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bastion_host() {
        let spec = BastionSpec {
            name: "foo-azure-bastion".to_string(),
            resource_group: "foo".to_string(),
            subscription_id: "123".to_string(),
            location: "eastus".to_string(),
            subnet_name: "AzureBastionSubnet".to_string(),
            vnet_name: "foo-vnet".to_string(),
            vnet_resource_group: "foo".to_string(),
            public_ip_name: "foo-azure-bastion-pip".to_string(),
            cluster_name: "foo".to_string(),
            additional_tags: Tags::new(),
        };
        let host = spec.parameters(None).unwrap().unwrap();
        let config = &host.properties.ip_configurations[0].properties;
        assert_eq!(config.subnet.id, ids::subnet_id("123", "foo", "foo-vnet", "AzureBastionSubnet"));
        assert_eq!(config.public_ip_address.id, ids::public_ip_id("123", "foo", "foo-azure-bastion-pip"));
        assert_eq!(host.properties.dns_name.as_deref(), Some("foo-azure-bastion-bastion"));
        assert_eq!(host.tags.get(azure_crds::v1beta1::tags::NAME_AZURE_CLUSTER_API_ROLE), Some("bastion"));

        assert!(spec.parameters(Some(&host)).unwrap().is_none());
    }
}
