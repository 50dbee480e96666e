//! v1alpha3 network types

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::v1alpha4::{FrontendIP, VnetSpec};
use crate::v1beta1::{RouteTable, SecurityGroup};

/// Subnet roles known to v1alpha3.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum SubnetRole {
    #[serde(rename = "control-plane")]
    ControlPlane,
    #[serde(rename = "node")]
    Node,
}

impl fmt::Display for SubnetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubnetRole::ControlPlane => f.write_str("control-plane"),
            SubnetRole::Node => f.write_str("node"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    #[serde(default)]
    pub vnet: VnetSpec,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetSpec>,

    #[serde(default, rename = "apiServerLB")]
    pub api_server_lb: LoadBalancerSpec,
}

/// Subnet without a NAT gateway.
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
}

/// API server load balancer; v1alpha3 has no outbound load balancers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sku: String,

    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_: String,

    #[serde(default, rename = "frontendIPs", skip_serializing_if = "Vec::is_empty")]
    pub frontend_ips: Vec<FrontendIP>,
}
