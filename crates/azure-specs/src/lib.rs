//! Azure Resource Spec Getters
//!
//! Turns defaulted `AzureCluster` and `AzureMachine` objects into the ARM
//! request bodies a reconciler sends to Azure. Every resource kind has a
//! spec type implementing [`ResourceSpecGetter`]; given the resource as it
//! currently exists (if at all), the getter returns the desired parameters,
//! or `None` when nothing needs to change.
//!
//! # Example
//!
//! ```no_run
//! use azure_crds::v1beta1::AzureCluster;
//! use azure_specs::{ClusterScope, ResourceSpecGetter};
//!
//! # fn example(cluster: &AzureCluster) -> Result<(), azure_specs::SpecError> {
//! let scope = ClusterScope::new("foo", cluster);
//! for spec in scope.subnet_specs() {
//!     if let Some(subnet) = spec.parameters(None)? {
//!         println!("create {}: {:?}", spec.resource_name(), subnet.properties.address_prefix);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Networking**: vnets, subnets, security groups, route tables, NAT gateways,
//!   public IPs, load balancers, inbound NAT rules, NICs and bastion hosts
//! - **Compute**: VMs, availability sets and the bootstrap extension
//! - **Scopes**: derive every spec of a cluster or machine from its hub object
//! - **Resource IDs**: build and parse ARM resource and provider IDs

pub mod error;
pub mod ids;
pub mod models;
pub mod names;
pub mod scope;
pub mod specs;
#[path = "trait.rs"]
pub mod spec_trait;

pub use error::SpecError;
pub use scope::{ClusterScope, MachineRole, MachineScope};
pub use spec_trait::{ResourceSpecGetter, existing_as};
pub use specs::*;
