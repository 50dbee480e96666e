//! v1alpha4 API (spoke version)
//!
//! Served for clients that have not moved to v1beta1. Every object
//! converts through the hub; see `conversion` for what is restored from
//! the hub annotation.

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
pub const VERSION: &str = "v1alpha4";

#[cfg(test)]
mod conversion_test;
