//! Subnet spec
//!
//! The CIDR list is written as `addressPrefix` when it holds exactly one
//! block and as `addressPrefixes` otherwise; Azure rejects the plural form
//! for single-prefix subnets in some regions.

use std::any::Any;

use azure_crds::v1beta1::SubnetRole;
use tracing::debug;

use super::same_id;
use crate::error::SpecError;
use crate::ids;
use crate::models::{SubResource, Subnet, SubnetProperties};
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Desired state of one subnet of the cluster vnet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubnetSpec {
    /// Subnet name
    pub name: String,
    /// Cluster resource group, which owns the NSG, route table and NAT gateway
    pub resource_group: String,
    /// Subscription of the referenced resources
    pub subscription_id: String,
    /// Address prefixes of the subnet
    pub cidrs: Vec<String>,
    /// Owning virtual network
    pub vnet_name: String,
    /// Resource group of the owning virtual network
    pub vnet_resource_group: String,
    /// False for a pre-existing vnet, whose subnets are never updated
    pub is_vnet_managed: bool,
    /// Attached route table; empty for none
    pub route_table_name: String,
    /// Attached network security group; empty for none
    pub security_group_name: String,
    /// Subnet role in the cluster
    pub role: Option<SubnetRole>,
    /// Attached NAT gateway; empty for none
    pub nat_gateway_name: String,
}

impl SubnetSpec {
    fn reference(&self, name: &str, id: fn(&str, &str, &str) -> String) -> Option<SubResource> {
        (!name.is_empty()).then(|| SubResource::new(id(&self.subscription_id, &self.resource_group, name)))
    }

    fn desired_properties(&self) -> SubnetProperties {
        let (address_prefix, address_prefixes) = match self.cidrs.as_slice() {
            [single] => (Some(single.clone()), None),
            many => (None, Some(many.to_vec())),
        };
        SubnetProperties {
            address_prefix,
            address_prefixes,
            network_security_group: self.reference(&self.security_group_name, ids::security_group_id),
            route_table: self.reference(&self.route_table_name, ids::route_table_id),
            nat_gateway: self.reference(&self.nat_gateway_name, ids::nat_gateway_id),
        }
    }
}

/// True when every desired reference is already attached.
fn references_attached(desired: &SubnetProperties, existing: &SubnetProperties) -> bool {
    let attached = |want: &Option<SubResource>, have: &Option<SubResource>| match (want, have) {
        (None, _) => true,
        (Some(want), Some(have)) => same_id(&want.id, &have.id),
        (Some(_), None) => false,
    };
    attached(&desired.network_security_group, &existing.network_security_group)
        && attached(&desired.route_table, &existing.route_table)
        && attached(&desired.nat_gateway, &existing.nat_gateway)
}

impl ResourceSpecGetter for SubnetSpec {
    type Parameters = Subnet;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn owner_resource_name(&self) -> &str {
        &self.vnet_name
    }

    fn resource_group_name(&self) -> &str {
        &self.vnet_resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<Subnet>, SpecError> {
        let desired = self.desired_properties();

        match existing_as::<Subnet>(existing)? {
            Some(existing) => {
                if !self.is_vnet_managed {
                    debug!(subnet = %self.name, "subnet belongs to a custom vnet, not updating");
                    return Ok(None);
                }
                if references_attached(&desired, &existing.properties) {
                    debug!(subnet = %self.name, "subnet is up to date");
                    return Ok(None);
                }
            }
            None if !self.is_vnet_managed => {
                return Err(SpecError::MissingSubnet {
                    name: self.name.clone(),
                });
            }
            None => {}
        }

        if self.cidrs.is_empty() {
            return Err(SpecError::MissingParameter(format!("CIDR blocks of subnet {}", self.name)));
        }
        Ok(Some(Subnet {
            id: None,
            name: Some(self.name.clone()),
            properties: desired,
        }))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn spec() -> SubnetSpec {
        SubnetSpec {
            name: "my-subnet".to_string(),
            resource_group: "my-rg".to_string(),
            subscription_id: "123".to_string(),
            cidrs: vec!["10.0.0.0/16".to_string()],
            vnet_name: "my-vnet".to_string(),
            vnet_resource_group: "my-rg".to_string(),
            is_vnet_managed: true,
            route_table_name: "my-subnet_route_table".to_string(),
            security_group_name: "my-sg".to_string(),
            role: Some(SubnetRole::Node),
            nat_gateway_name: "my-nat-gateway".to_string(),
        }
    }

    #[test]
    fn test_new_subnet_single_cidr() {
        let subnet = spec().parameters(None).unwrap().unwrap();
        let value = serde_json::to_value(&subnet).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "my-subnet",
                "properties": {
                    "addressPrefix": "10.0.0.0/16",
                    "networkSecurityGroup": {
                        "id": "/subscriptions/123/resourceGroups/my-rg/providers/Microsoft.Network/networkSecurityGroups/my-sg"
                    },
                    "routeTable": {
                        "id": "/subscriptions/123/resourceGroups/my-rg/providers/Microsoft.Network/routeTables/my-subnet_route_table"
                    },
                    "natGateway": {
                        "id": "/subscriptions/123/resourceGroups/my-rg/providers/Microsoft.Network/natGateways/my-nat-gateway"
                    }
                }
            })
        );
    }

    #[test]
    fn test_new_subnet_multiple_cidrs() {
        let mut spec = spec();
        spec.cidrs.push("2001:1234:5678:9a00::/56".to_string());
        let subnet = spec.parameters(None).unwrap().unwrap();
        assert_eq!(subnet.properties.address_prefix, None);
        assert_eq!(
            subnet.properties.address_prefixes,
            Some(vec!["10.0.0.0/16".to_string(), "2001:1234:5678:9a00::/56".to_string()])
        );
        let value = serde_json::to_value(&subnet).unwrap();
        assert!(value["properties"].get("addressPrefix").is_none());
    }

    #[test]
    fn test_missing_subnet_in_custom_vnet() {
        let mut spec = spec();
        spec.is_vnet_managed = false;
        let err = spec.parameters(None).unwrap_err();
        assert_eq!(err.to_string(), "custom vnet was provided but subnet my-subnet is missing");
    }

    #[test]
    fn test_existing_subnet_in_custom_vnet() {
        let mut spec = spec();
        spec.is_vnet_managed = false;
        let existing = Subnet::default();
        assert!(spec.parameters(Some(&existing)).unwrap().is_none());
    }

    #[test]
    fn test_existing_subnet_up_to_date() {
        let spec = spec();
        let existing = Subnet {
            properties: SubnetProperties {
                address_prefix: Some("10.0.0.0/16".to_string()),
                network_security_group: Some(SubResource::new(
                    "/subscriptions/123/resourceGroups/MY-RG/providers/Microsoft.Network/networkSecurityGroups/my-sg",
                )),
                route_table: Some(SubResource::new(ids::route_table_id("123", "my-rg", "my-subnet_route_table"))),
                nat_gateway: Some(SubResource::new(ids::nat_gateway_id("123", "my-rg", "my-nat-gateway"))),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(spec.parameters(Some(&existing)).unwrap().is_none());
    }

    #[test]
    fn test_existing_subnet_missing_nat_gateway() {
        let spec = spec();
        let existing = Subnet {
            properties: SubnetProperties {
                network_security_group: Some(SubResource::new(ids::security_group_id("123", "my-rg", "my-sg"))),
                route_table: Some(SubResource::new(ids::route_table_id("123", "my-rg", "my-subnet_route_table"))),
                ..Default::default()
            },
            ..Default::default()
        };
        let subnet = spec.parameters(Some(&existing)).unwrap().unwrap();
        assert_eq!(
            subnet.properties.nat_gateway.unwrap().id,
            ids::nat_gateway_id("123", "my-rg", "my-nat-gateway")
        );
    }

    #[test]
    fn test_control_plane_subnet_without_route_table() {
        let mut spec = spec();
        spec.role = Some(SubnetRole::ControlPlane);
        spec.route_table_name = String::new();
        spec.nat_gateway_name = String::new();
        let subnet = spec.parameters(None).unwrap().unwrap();
        assert!(subnet.properties.route_table.is_none());
        assert!(subnet.properties.nat_gateway.is_none());
        assert!(subnet.properties.network_security_group.is_some());
    }
}
