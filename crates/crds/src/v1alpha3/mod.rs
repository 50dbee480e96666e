//! v1alpha3 API (spoke version)
//!
//! The oldest served version. It predates outbound load balancers,
//! NAT gateways, bastion hosts and `cluster` subnets; objects using those
//! only survive a trip through v1alpha3 via the hub annotation.

pub mod azure_cluster;
pub mod azure_cluster_identity;
pub mod azure_machine;
pub mod azure_machine_template;
pub mod conversion;
pub mod types;

pub use azure_cluster::*;
pub use azure_cluster_identity::*;
pub use azure_machine::*;
pub use azure_machine_template::*;
pub use types::*;

/// Version name.
pub const VERSION: &str = "v1alpha3";

#[cfg(test)]
mod conversion_test;
