//! ARM resource IDs and machine provider IDs
//!
//! Downstream reconcilers wire resources together by ID, so every format
//! here is part of the external contract.

use std::fmt;
use std::str::FromStr;

use crate::error::SpecError;

/// Resource provider namespace of network resources.
pub const NETWORK_NAMESPACE: &str = "Microsoft.Network";
/// Resource provider namespace of compute resources.
pub const COMPUTE_NAMESPACE: &str = "Microsoft.Compute";
/// Scheme prefix of a machine provider ID.
pub const PROVIDER_ID_PREFIX: &str = "azure://";

fn resource_id(subscription: &str, group: &str, namespace: &str, type_: &str, name: &str) -> String {
    format!("/subscriptions/{subscription}/resourceGroups/{group}/providers/{namespace}/{type_}/{name}")
}

fn network_id(subscription: &str, group: &str, type_: &str, name: &str) -> String {
    resource_id(subscription, group, NETWORK_NAMESPACE, type_, name)
}

/// `.../virtualNetworks/{vnet}`
pub fn vnet_id(subscription: &str, group: &str, vnet: &str) -> String {
    network_id(subscription, group, "virtualNetworks", vnet)
}

/// `.../virtualNetworks/{vnet}/subnets/{subnet}`
pub fn subnet_id(subscription: &str, group: &str, vnet: &str, subnet: &str) -> String {
    format!("{}/subnets/{subnet}", vnet_id(subscription, group, vnet))
}

/// `.../networkSecurityGroups/{name}`
pub fn security_group_id(subscription: &str, group: &str, name: &str) -> String {
    network_id(subscription, group, "networkSecurityGroups", name)
}

/// `.../routeTables/{name}`
pub fn route_table_id(subscription: &str, group: &str, name: &str) -> String {
    network_id(subscription, group, "routeTables", name)
}

/// `.../natGateways/{name}`
pub fn nat_gateway_id(subscription: &str, group: &str, name: &str) -> String {
    network_id(subscription, group, "natGateways", name)
}

/// `.../publicIPAddresses/{name}`
pub fn public_ip_id(subscription: &str, group: &str, name: &str) -> String {
    network_id(subscription, group, "publicIPAddresses", name)
}

/// `.../networkInterfaces/{name}`
pub fn network_interface_id(subscription: &str, group: &str, name: &str) -> String {
    network_id(subscription, group, "networkInterfaces", name)
}

/// `.../loadBalancers/{lb}`
pub fn load_balancer_id(subscription: &str, group: &str, lb: &str) -> String {
    network_id(subscription, group, "loadBalancers", lb)
}

/// `.../loadBalancers/{lb}/frontendIPConfigurations/{name}`
pub fn frontend_ip_config_id(subscription: &str, group: &str, lb: &str, name: &str) -> String {
    format!("{}/frontendIPConfigurations/{name}", load_balancer_id(subscription, group, lb))
}

/// `.../loadBalancers/{lb}/backendAddressPools/{name}`
pub fn backend_pool_id(subscription: &str, group: &str, lb: &str, name: &str) -> String {
    format!("{}/backendAddressPools/{name}", load_balancer_id(subscription, group, lb))
}

/// `.../loadBalancers/{lb}/probes/{name}`
pub fn probe_id(subscription: &str, group: &str, lb: &str, name: &str) -> String {
    format!("{}/probes/{name}", load_balancer_id(subscription, group, lb))
}

/// `.../loadBalancers/{lb}/inboundNatRules/{name}`
pub fn inbound_nat_rule_id(subscription: &str, group: &str, lb: &str, name: &str) -> String {
    format!("{}/inboundNatRules/{name}", load_balancer_id(subscription, group, lb))
}

/// `.../Microsoft.Compute/virtualMachines/{name}`
pub fn vm_id(subscription: &str, group: &str, name: &str) -> String {
    resource_id(subscription, group, COMPUTE_NAMESPACE, "virtualMachines", name)
}

/// `.../Microsoft.Compute/availabilitySets/{name}`
pub fn availability_set_id(subscription: &str, group: &str, name: &str) -> String {
    resource_id(subscription, group, COMPUTE_NAMESPACE, "availabilitySets", name)
}

/// `.../Microsoft.Compute/galleries/{gallery}/images/{image}/versions/{version}`
pub fn shared_gallery_image_id(subscription: &str, group: &str, gallery: &str, image: &str, version: &str) -> String {
    format!(
        "{}/images/{image}/versions/{version}",
        resource_id(subscription, group, COMPUTE_NAMESPACE, "galleries", gallery)
    )
}

/// Provider ID of the VM with ARM ID `vm_id`.
pub fn provider_id(vm_id: &str) -> String {
    format!("{PROVIDER_ID_PREFIX}{vm_id}")
}

/// Parses a provider ID back into the VM's resource ID.
pub fn parse_provider_id(provider_id: &str) -> Result<ResourceId, SpecError> {
    provider_id
        .strip_prefix(PROVIDER_ID_PREFIX)
        .ok_or_else(|| SpecError::InvalidProviderId(provider_id.to_string()))?
        .parse()
        .map_err(|_| SpecError::InvalidProviderId(provider_id.to_string()))
}

/// A parsed ARM resource ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    /// Subscription ID
    pub subscription_id: String,
    /// Resource group name
    pub resource_group: String,
    /// Provider namespace, e.g. `Microsoft.Compute`
    pub namespace: String,
    /// Top-level resource type, e.g. `virtualMachines`
    pub resource_type: String,
    /// Top-level resource name
    pub name: String,
    /// Child `(type, name)` pairs, outermost first
    pub children: Vec<(String, String)>,
}

impl ResourceId {
    /// Name of the innermost resource.
    pub fn leaf_name(&self) -> &str {
        self.children.last().map_or(self.name.as_str(), |(_, name)| name.as_str())
    }
}

impl FromStr for ResourceId {
    type Err = SpecError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let invalid = || SpecError::InvalidProviderId(id.to_string());
        let segments: Vec<&str> = id
            .strip_prefix('/')
            .ok_or_else(invalid)?
            .split('/')
            .collect();
        if segments.len() < 8 || segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty()) {
            return Err(invalid());
        }
        let keyword = |index: usize, expected: &str| segments[index].eq_ignore_ascii_case(expected);
        if !keyword(0, "subscriptions") || !keyword(2, "resourceGroups") || !keyword(4, "providers") {
            return Err(invalid());
        }

        let children = segments[8..]
            .chunks(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();
        Ok(ResourceId {
            subscription_id: segments[1].to_string(),
            resource_group: segments[3].to_string(),
            namespace: segments[5].to_string(),
            resource_type: segments[6].to_string(),
            name: segments[7].to_string(),
            children,
        })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            resource_id(
                &self.subscription_id,
                &self.resource_group,
                &self.namespace,
                &self.resource_type,
                &self.name
            )
        )?;
        for (type_, name) in &self.children {
            write!(f, "/{type_}/{name}")?;
        }
        Ok(())
    }
}
