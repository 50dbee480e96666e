//! v1alpha4 network types
//!
//! Only the shapes that differ from v1beta1 are declared here; security
//! groups, route tables and subnet roles are shared with the hub.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::v1beta1::{RouteTable, SecurityGroup, SubnetRole, Tags};

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    #[serde(default)]
    pub vnet: VnetSpec,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetSpec>,

    #[serde(default, rename = "apiServerLB")]
    pub api_server_lb: LoadBalancerSpec,

    #[serde(default, rename = "nodeOutboundLB", skip_serializing_if = "Option::is_none")]
    pub node_outbound_lb: Option<LoadBalancerSpec>,

    #[serde(default, rename = "controlPlaneOutboundLB", skip_serializing_if = "Option::is_none")]
    pub control_plane_outbound_lb: Option<LoadBalancerSpec>,

    #[serde(default, rename = "privateDNSZoneName", skip_serializing_if = "String::is_empty")]
    pub private_dns_zone_name: String,
}

/// Virtual network without peerings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VnetSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cidr_blocks: Vec<String>,

    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<SubnetRole>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cidr_blocks: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub security_group: SecurityGroup,

    #[serde(default)]
    pub route_table: RouteTable,

    #[serde(default)]
    pub nat_gateway: NatGateway,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NatGateway {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, rename = "ip")]
    pub nat_gateway_ip: PublicIPSpec,
}

/// Public IP without IP tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicIPSpec {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dns_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, rename = "frontendIPs", skip_serializing_if = "Vec::is_empty")]
    pub frontend_ips: Vec<FrontendIP>,

    #[serde(default, rename = "frontendIPsCount", skip_serializing_if = "Option::is_none")]
    pub frontend_ips_count: Option<i32>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sku: String,

    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_in_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrontendIP {
    #[serde(default)]
    pub name: String,

    #[serde(default, rename = "privateIP", skip_serializing_if = "String::is_empty")]
    pub private_ip_address: String,

    #[serde(default, rename = "publicIP", skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<PublicIPSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BastionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_bastion: Option<AzureBastion>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AzureBastion {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default)]
    pub subnet: SubnetSpec,

    #[serde(default, rename = "publicIP")]
    pub public_ip: PublicIPSpec,
}
