//! One spec per Azure resource kind
//!
//! Every spec implements [`ResourceSpecGetter`](crate::spec_trait::ResourceSpecGetter).
//! Specs carry plain names; IDs of referenced resources are derived from
//! the subscription and resource group with the helpers in [`crate::ids`].

pub mod availability_set;
pub mod bastion;
pub mod inbound_nat;
pub mod load_balancer;
pub mod nat_gateway;
pub mod network_interface;
pub mod public_ip;
pub mod route_table;
pub mod security_group;
pub mod subnet;
pub mod virtual_machine;
pub mod vm_extension;
pub mod vnet;

pub use availability_set::AvailabilitySetSpec;
pub use bastion::BastionSpec;
pub use inbound_nat::InboundNatSpec;
pub use load_balancer::{LBSpec, LoadBalancerRole};
pub use nat_gateway::NatGatewaySpec;
pub use network_interface::NICSpec;
pub use public_ip::PublicIPSpec;
pub use route_table::RouteTableSpec;
pub use security_group::SecurityGroupSpec;
pub use subnet::SubnetSpec;
pub use virtual_machine::VMSpec;
pub use vm_extension::VMExtensionSpec;
pub use vnet::VNetSpec;

use azure_crds::v1beta1::Tags;
use azure_crds::v1beta1::tags::{self, BuildParams, RESOURCE_LIFECYCLE_OWNED};

/// Tags of a resource owned by `cluster`.
pub(crate) fn owned_tags(cluster: &str, name: &str, role: Option<&str>, additional: &Tags) -> Tags {
    tags::build(&BuildParams {
        cluster_name: cluster.to_string(),
        lifecycle: RESOURCE_LIFECYCLE_OWNED.to_string(),
        name: Some(name.to_string()),
        role: role.map(str::to_string),
        additional: additional.clone(),
    })
}

/// Case-insensitive ARM ID comparison.
pub(crate) fn same_id(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
