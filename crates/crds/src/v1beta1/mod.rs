//! v1beta1 API (hub version)
//!
//! Every field of every kind lives here; the older versions convert
//! through these types. Admission hooks:
//! - defaulting: `azure_cluster_default`, `azure_machine_default`
//! - validation: `azure_cluster_validation`, `azure_machine_validation`
//! - templates and identities: `azure_cluster_template_webhook`, `azure_cluster_identity_webhook`

pub mod azure_cluster;
pub mod azure_cluster_default;
pub mod azure_cluster_identity;
pub mod azure_cluster_identity_webhook;
pub mod azure_cluster_template;
pub mod azure_cluster_template_webhook;
pub mod azure_cluster_validation;
pub mod azure_machine;
pub mod azure_machine_default;
pub mod azure_machine_template;
pub mod azure_machine_validation;
pub mod tags;
pub mod types;
pub mod validation;

pub use azure_cluster::*;
pub use azure_cluster_identity::*;
pub use azure_cluster_identity_webhook::*;
pub use azure_cluster_template::*;
pub use azure_cluster_template_webhook::*;
pub use azure_cluster_validation::*;
pub use azure_machine::*;
pub use azure_machine_default::*;
pub use azure_machine_template::*;
pub use azure_machine_validation::*;
pub use tags::Tags;
pub use types::*;

/// Version name of the hub.
pub const VERSION: &str = "v1beta1";

/// API version string of the hub.
pub const API_VERSION: &str = "infrastructure.cluster.x-k8s.io/v1beta1";

#[cfg(test)]
mod azure_cluster_default_test;
