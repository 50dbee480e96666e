//! Azure infrastructure CRD definitions
//!
//! Kubernetes Custom Resource Definitions for the Cluster API Azure
//! provider, in three served versions:
//! - `v1beta1`: the hub, carrying every field, with defaulting and validation
//! - `v1alpha4`, `v1alpha3`: spokes that convert through the hub
//!
//! Supporting modules:
//! - `scheme`: (group, version, kind) registration and hub bookkeeping
//! - `conversion`: hub/spoke conversion with annotation preservation
//! - `webhook`: admission traits implemented by every hub kind
//! - `field`, `error`: field-scoped validation errors
//! - `naming`: deterministic Azure resource names

pub mod capi;
pub mod conversion;
pub mod error;
pub mod field;
pub mod naming;
pub mod scheme;
pub mod v1alpha3;
pub mod v1alpha4;
pub mod v1beta1;
pub mod webhook;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::ApiError;
pub use field::{ErrorList, ErrorType, FieldError, FieldPath};
pub use scheme::{Scheme, default_scheme};
pub use webhook::{Defaulter, Validator};

/// API group of every infrastructure kind.
pub const GROUP: &str = "infrastructure.cluster.x-k8s.io";
