//! Network types shared by the v1beta1 cluster kinds
//!
//! Plain string fields use empty-string-as-absent, matching the JSON
//! stored in existing clusters (omitted when empty). Numeric and
//! boolean fields whose absence matters are `Option`.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::tags::Tags;

/// Only supported load balancer SKU.
pub const SKU_STANDARD: &str = "Standard";
/// Public load balancer.
pub const LB_TYPE_PUBLIC: &str = "Public";
/// Internal load balancer.
pub const LB_TYPE_INTERNAL: &str = "Internal";
/// Default load balancer idle timeout.
pub const DEFAULT_LB_IDLE_TIMEOUT_IN_MINUTES: i32 = 4;
/// Upper bound on outbound load balancer frontend IPs.
pub const MAX_LOAD_BALANCER_OUTBOUND_IPS: i32 = 16;

/// Security rule protocols.
pub const SECURITY_RULE_PROTOCOLS: [&str; 4] = ["Tcp", "Udp", "Icmp", "*"];
/// Inbound security rule direction.
pub const SECURITY_RULE_DIRECTION_INBOUND: &str = "Inbound";
/// Outbound security rule direction.
pub const SECURITY_RULE_DIRECTION_OUTBOUND: &str = "Outbound";

/// Subnet role within the cluster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubnetRole {
    /// Hosts control plane machines
    #[serde(rename = "control-plane")]
    ControlPlane,
    /// Hosts worker machines
    #[serde(rename = "node")]
    Node,
    /// Hosts the Azure Bastion
    #[serde(rename = "bastion")]
    Bastion,
    /// Shared by control plane and worker machines
    #[serde(rename = "cluster")]
    Cluster,
}

impl SubnetRole {
    /// Wire value of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            SubnetRole::ControlPlane => "control-plane",
            SubnetRole::Node => "node",
            SubnetRole::Bastion => "bastion",
            SubnetRole::Cluster => "cluster",
        }
    }
}

impl fmt::Display for SubnetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network layout of the cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    /// Virtual network
    #[serde(default)]
    pub vnet: VnetSpec,

    /// Subnets in the virtual network
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetSpec>,

    /// Load balancer in front of the API server
    #[serde(default, rename = "apiServerLB")]
    pub api_server_lb: LoadBalancerSpec,

    /// Outbound load balancer for nodes
    #[serde(default, rename = "nodeOutboundLB", skip_serializing_if = "Option::is_none")]
    pub node_outbound_lb: Option<LoadBalancerSpec>,

    /// Outbound load balancer for control plane machines of private clusters
    #[serde(default, rename = "controlPlaneOutboundLB", skip_serializing_if = "Option::is_none")]
    pub control_plane_outbound_lb: Option<LoadBalancerSpec>,

    /// Private DNS zone for internal clusters
    #[serde(default, rename = "privateDNSZoneName", skip_serializing_if = "String::is_empty")]
    pub private_dns_zone_name: String,
}

impl NetworkSpec {
    /// Subnets with `role`.
    pub fn subnets_with_role(&self, role: SubnetRole) -> impl Iterator<Item = &SubnetSpec> {
        self.subnets.iter().filter(move |s| s.role == Some(role))
    }

    /// Subnet hosting the control plane (a `cluster` subnet counts).
    pub fn control_plane_subnet(&self) -> Option<&SubnetSpec> {
        self.subnets_with_role(SubnetRole::ControlPlane)
            .next()
            .or_else(|| self.subnets_with_role(SubnetRole::Cluster).next())
    }

    /// Subnets hosting worker nodes (`node` and `cluster` roles).
    pub fn node_subnets(&self) -> impl Iterator<Item = &SubnetSpec> {
        self.subnets
            .iter()
            .filter(|s| matches!(s.role, Some(SubnetRole::Node | SubnetRole::Cluster)))
    }

    /// True when a single `cluster` subnet serves all machines.
    pub fn has_cluster_subnet(&self) -> bool {
        self.subnets_with_role(SubnetRole::Cluster).next().is_some()
    }
}

/// Virtual network.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VnetSpec {
    /// Resource group of the vnet; defaults to the cluster resource group
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group: String,

    /// ARM ID of a pre-existing vnet
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Vnet name
    #[serde(default)]
    pub name: String,

    /// Address space
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cidr_blocks: Vec<String>,

    /// Tags applied to the vnet
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,

    /// Peerings to other vnets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peerings: Vec<VnetPeeringSpec>,
}

impl VnetSpec {
    /// A vnet is managed when it has no external ID or carries the owned tag.
    pub fn is_managed(&self, cluster: &str) -> bool {
        self.id.is_empty() || self.tags.has_owned(cluster)
    }
}

/// Peering from the cluster vnet to a remote vnet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VnetPeeringSpec {
    /// Resource group of the remote vnet
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group: String,

    /// Name of the remote vnet
    #[serde(default)]
    pub remote_vnet_name: String,
}

/// Subnet of the cluster vnet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    /// Subnet role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<SubnetRole>,

    /// Address prefixes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cidr_blocks: Vec<String>,

    /// ARM ID of a pre-existing subnet
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Subnet name
    #[serde(default)]
    pub name: String,

    /// Network security group attached to the subnet
    #[serde(default)]
    pub security_group: SecurityGroup,

    /// Route table attached to the subnet
    #[serde(default)]
    pub route_table: RouteTable,

    /// NAT gateway providing egress for the subnet
    #[serde(default)]
    pub nat_gateway: NatGateway,
}

impl SubnetSpec {
    /// True when the subnet egresses through a NAT gateway.
    pub fn is_nat_gateway_enabled(&self) -> bool {
        !self.nat_gateway.name.is_empty()
    }
}

/// Network security group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroup {
    /// ARM ID
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// NSG name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Rules in evaluation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_rules: Vec<SecurityRule>,

    /// Tags applied to the NSG
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

/// A single NSG rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRule {
    /// Rule name
    pub name: String,

    /// Free-form description, at most 140 characters
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// `Tcp`, `Udp`, `Icmp` or `*`
    #[serde(default)]
    pub protocol: String,

    /// `Inbound` or `Outbound`; defaults to `Inbound`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub direction: String,

    /// Priority between 100 and 4096
    #[serde(default)]
    pub priority: i32,

    /// Source address prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Source port range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ports: Option<String>,

    /// Destination address prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Destination port range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_ports: Option<String>,
}

/// Route table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RouteTable {
    /// ARM ID
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Route table name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// NAT gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NatGateway {
    /// ARM ID
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// NAT gateway name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Public IP used for egress
    #[serde(default, rename = "ip")]
    pub nat_gateway_ip: PublicIPSpec,
}

/// Public IP address.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicIPSpec {
    /// Public IP name
    #[serde(default)]
    pub name: String,

    /// DNS label
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dns_name: String,

    /// IP tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_tags: Vec<IPTag>,
}

/// Tag attached to a public IP.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct IPTag {
    /// Tag type, e.g. `RoutingPreference`
    #[serde(rename = "type")]
    pub type_: String,

    /// Tag value
    pub tag: String,
}

/// Load balancer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    /// ARM ID
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Load balancer name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Frontend IP configurations
    #[serde(default, rename = "frontendIPs", skip_serializing_if = "Vec::is_empty")]
    pub frontend_ips: Vec<FrontendIP>,

    /// Number of frontend IPs to generate for outbound load balancers
    #[serde(default, rename = "frontendIPsCount", skip_serializing_if = "Option::is_none")]
    pub frontend_ips_count: Option<i32>,

    /// Only `Standard` is supported
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sku: String,

    /// `Public` or `Internal`
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_: String,

    /// TCP idle timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_in_minutes: Option<i32>,
}

impl LoadBalancerSpec {
    /// True for `Internal` load balancers.
    pub fn is_internal(&self) -> bool {
        self.type_ == LB_TYPE_INTERNAL
    }

    /// True for `Public` load balancers.
    pub fn is_public(&self) -> bool {
        self.type_ == LB_TYPE_PUBLIC
    }
}

/// Load balancer frontend IP configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrontendIP {
    /// Configuration name
    pub name: String,

    /// Private IP for internal load balancers
    #[serde(default, rename = "privateIP", skip_serializing_if = "String::is_empty")]
    pub private_ip_address: String,

    /// Public IP for public load balancers
    #[serde(default, rename = "publicIP", skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<PublicIPSpec>,
}

/// Bastion configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BastionSpec {
    /// Azure Bastion host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_bastion: Option<AzureBastion>,
}

/// Azure Bastion host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AzureBastion {
    /// Bastion name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Dedicated bastion subnet
    #[serde(default)]
    pub subnet: SubnetSpec,

    /// Bastion public IP
    #[serde(default, rename = "publicIP")]
    pub public_ip: PublicIPSpec,
}

/// Overrides for the cloud provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CloudProviderConfigOverrides {
    /// Per-client rate limits
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rate_limits: Vec<RateLimitSpec>,

    /// Backoff settings
    #[serde(default)]
    pub back_offs: BackOffConfig,
}

/// Client names accepted in `rateLimits`.
pub const SUPPORTED_RATE_LIMIT_NAMES: [&str; 10] = [
    "defaultRateLimit",
    "routeRateLimit",
    "subnetsRateLimit",
    "interfaceRateLimit",
    "routeTableRateLimit",
    "loadBalancerRateLimit",
    "publicIPAddressRateLimit",
    "securityGroupRateLimit",
    "virtualMachineRateLimit",
    "virtualMachineScaleSetRateLimit",
];

/// Rate limit for a named client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RateLimitSpec {
    /// Client name
    pub name: String,

    /// Limits
    #[serde(default)]
    pub config: RateLimitConfig,
}

/// Token bucket settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cloud_provider_rate_limit: bool,

    /// Read QPS as a quantity string
    #[serde(default, rename = "cloudProviderRateLimitQPS", skip_serializing_if = "Option::is_none")]
    pub cloud_provider_rate_limit_qps: Option<String>,

    /// Read bucket size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider_rate_limit_bucket: Option<i32>,

    /// Write QPS as a quantity string
    #[serde(default, rename = "cloudProviderRateLimitQPSWrite", skip_serializing_if = "Option::is_none")]
    pub cloud_provider_rate_limit_qps_write: Option<String>,

    /// Write bucket size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider_rate_limit_bucket_write: Option<i32>,
}

/// Retry backoff settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BackOffConfig {
    /// Enable backoff
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cloud_provider_backoff: bool,

    /// Retry count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider_backoff_retries: Option<i32>,

    /// Exponent as a quantity string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider_backoff_exponent: Option<String>,

    /// Duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider_backoff_duration: Option<i32>,

    /// Jitter as a quantity string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider_backoff_jitter: Option<String>,
}
