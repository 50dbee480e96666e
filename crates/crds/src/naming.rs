//! Default Azure resource names
//!
//! Every generated name is a pure function of the cluster name (plus the
//! subnet name or role where noted). These strings become Azure resource
//! names, so they must stay byte-identical across releases.

/// Role suffix used for node outbound resources.
pub const NODE_OUTBOUND_ROLE: &str = "node";
/// Role suffix used for control plane outbound resources.
pub const CONTROL_PLANE_OUTBOUND_ROLE: &str = "controlplane";

/// Fixed name Azure requires for the bastion subnet.
pub const AZURE_BASTION_SUBNET_NAME: &str = "AzureBastionSubnet";
/// Default CIDR for the bastion subnet.
pub const DEFAULT_AZURE_BASTION_SUBNET_CIDR: &str = "10.255.255.224/27";

/// Default vnet CIDR.
pub const DEFAULT_VNET_CIDR: &str = "10.0.0.0/8";
/// Default control plane subnet CIDR.
pub const DEFAULT_CONTROL_PLANE_SUBNET_CIDR: &str = "10.0.0.0/16";
/// Default node subnet CIDR.
pub const DEFAULT_NODE_SUBNET_CIDR: &str = "10.1.0.0/16";
/// Default CIDR of a shared `cluster` subnet.
pub const DEFAULT_CLUSTER_SUBNET_CIDR: &str = "10.0.0.0/16";
/// Default private IP of an internal API server load balancer.
pub const DEFAULT_INTERNAL_LB_IP: &str = "10.0.0.100";

/// `<cluster>-vnet`
pub fn vnet_name(cluster: &str) -> String {
    format!("{cluster}-vnet")
}

/// `<cluster>-controlplane-subnet`
pub fn control_plane_subnet_name(cluster: &str) -> String {
    format!("{cluster}-controlplane-subnet")
}

/// `<cluster>-node-subnet`
pub fn node_subnet_name(cluster: &str) -> String {
    format!("{cluster}-node-subnet")
}

/// `<cluster>-subnet`, the shared subnet of a single-subnet cluster
pub fn cluster_subnet_name(cluster: &str) -> String {
    format!("{cluster}-subnet")
}

/// `<cluster>-nsg`
pub fn cluster_security_group_name(cluster: &str) -> String {
    format!("{cluster}-nsg")
}

/// `<cluster>-routetable`
pub fn cluster_route_table_name(cluster: &str) -> String {
    format!("{cluster}-routetable")
}

/// `10.<n>.0.0/16` for the n-th node subnet
pub fn node_subnet_cidr(n: usize) -> String {
    format!("10.{n}.0.0/16")
}

/// `<cluster>-controlplane-nsg`
pub fn control_plane_security_group_name(cluster: &str) -> String {
    format!("{cluster}-controlplane-nsg")
}

/// `<cluster>-node-nsg`
pub fn node_security_group_name(cluster: &str) -> String {
    format!("{cluster}-node-nsg")
}

/// `<cluster>-node-routetable`
pub fn node_route_table_name(cluster: &str) -> String {
    format!("{cluster}-node-routetable")
}

/// `pip-<cluster>-<subnet>-natgw`
pub fn nat_gateway_ip_name(cluster: &str, subnet: &str) -> String {
    format!("pip-{cluster}-{subnet}-natgw")
}

/// `<cluster>-public-lb`
pub fn public_lb_name(cluster: &str) -> String {
    format!("{cluster}-public-lb")
}

/// `<cluster>-internal-lb`
pub fn internal_lb_name(cluster: &str) -> String {
    format!("{cluster}-internal-lb")
}

/// `<cluster>-outbound-lb`
pub fn control_plane_outbound_lb_name(cluster: &str) -> String {
    format!("{cluster}-outbound-lb")
}

/// The node outbound load balancer shares the cluster's name.
pub fn node_outbound_lb_name(cluster: &str) -> String {
    cluster.to_string()
}

/// `<lb>-frontEnd`
pub fn frontend_ip_config_name(lb: &str) -> String {
    format!("{lb}-frontEnd")
}

/// `pip-<cluster>-apiserver`
pub fn api_server_public_ip_name(cluster: &str) -> String {
    format!("pip-{cluster}-apiserver")
}

/// `pip-<cluster>-<role>-outbound`
pub fn outbound_public_ip_name(cluster: &str, role: &str) -> String {
    format!("pip-{cluster}-{role}-outbound")
}

/// `<cluster>-azure-bastion`
pub fn azure_bastion_name(cluster: &str) -> String {
    format!("{cluster}-azure-bastion")
}

/// `<cluster>-azure-bastion-pip`
pub fn azure_bastion_public_ip_name(cluster: &str) -> String {
    format!("{cluster}-azure-bastion-pip")
}

/// Appends a 1-based index: `<name>-<n>`.
pub fn with_index(name: &str, n: usize) -> String {
    format!("{name}-{n}")
}
