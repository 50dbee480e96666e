//! Network interface spec

use std::any::Any;

use azure_crds::v1beta1::Tags;

use super::owned_tags;
use crate::error::SpecError;
use crate::ids;
use crate::models::{
    InterfaceIPConfiguration, InterfaceIPConfigurationProperties, NetworkInterface,
    NetworkInterfaceProperties, SubResource,
};
use crate::names::NIC_IP_CONFIG_NAME;
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Desired NIC of a machine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NICSpec {
    pub name: String,
    pub resource_group: String,
    pub subscription_id: String,
    pub location: String,
    pub machine_name: String,
    pub subnet_name: String,
    pub vnet_name: String,
    pub vnet_resource_group: String,
    pub static_ip: Option<String>,
    pub public_lb_name: Option<String>,
    pub public_lb_backend_pool_name: Option<String>,
    pub public_lb_nat_rule_name: Option<String>,
    pub internal_lb_name: Option<String>,
    pub internal_lb_backend_pool_name: Option<String>,
    pub public_ip_name: Option<String>,
    pub accelerated_networking: Option<bool>,
    pub ip_forwarding: bool,
    pub cluster_name: String,
    pub additional_tags: Tags,
}

impl NICSpec {
    fn lb_ref(&self, lb: Option<&String>, child: Option<&String>, id: fn(&str, &str, &str, &str) -> String) -> Option<SubResource> {
        let (lb, child) = (lb?, child?);
        Some(SubResource::new(id(&self.subscription_id, &self.resource_group, lb, child)))
    }
}

impl ResourceSpecGetter for NICSpec {
    type Parameters = NetworkInterface;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<NetworkInterface>, SpecError> {
        if existing_as::<NetworkInterface>(existing)?.is_some() {
            return Ok(None);
        }
        if self.subnet_name.is_empty() {
            return Err(SpecError::MissingParameter(format!("subnet of NIC {}", self.name)));
        }

        let backend_pools = [
            self.lb_ref(self.public_lb_name.as_ref(), self.public_lb_backend_pool_name.as_ref(), ids::backend_pool_id),
            self.lb_ref(self.internal_lb_name.as_ref(), self.internal_lb_backend_pool_name.as_ref(), ids::backend_pool_id),
        ];
        let nat_rules = self.lb_ref(self.public_lb_name.as_ref(), self.public_lb_nat_rule_name.as_ref(), ids::inbound_nat_rule_id);

        let ip_configuration = InterfaceIPConfiguration {
            name: NIC_IP_CONFIG_NAME.to_string(),
            properties: InterfaceIPConfigurationProperties {
                primary: true,
                subnet: SubResource::new(ids::subnet_id(
                    &self.subscription_id,
                    &self.vnet_resource_group,
                    &self.vnet_name,
                    &self.subnet_name,
                )),
                private_ip_allocation_method: if self.static_ip.is_some() { "Static" } else { "Dynamic" }.to_string(),
                private_ip_address: self.static_ip.clone(),
                public_ip_address: self
                    .public_ip_name
                    .as_ref()
                    .map(|ip| SubResource::new(ids::public_ip_id(&self.subscription_id, &self.resource_group, ip))),
                load_balancer_backend_address_pools: backend_pools.into_iter().flatten().collect(),
                load_balancer_inbound_nat_rules: nat_rules.into_iter().collect(),
            },
        };

        Ok(Some(NetworkInterface {
            location: self.location.clone(),
            tags: owned_tags(&self.cluster_name, &self.name, None, &self.additional_tags),
            properties: NetworkInterfaceProperties {
                ip_configurations: vec![ip_configuration],
                enable_accelerated_networking: self.accelerated_networking,
                enable_ip_forwarding: self.ip_forwarding,
            },
        }))
    }
}
