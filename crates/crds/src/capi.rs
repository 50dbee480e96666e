//! Cluster API core types referenced by the infrastructure specs
//!
//! These are the small, version-independent shapes that every API
//! version of the infrastructure kinds embeds unchanged.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Endpoint used to reach the cluster's API server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct APIEndpoint {
    /// Hostname or IP address
    #[serde(default)]
    pub host: String,

    /// TCP port
    #[serde(default)]
    pub port: i32,
}

impl APIEndpoint {
    /// True when neither host nor port has been set.
    pub fn is_zero(&self) -> bool {
        self.host.is_empty() && self.port == 0
    }
}

/// Reference to another Kubernetes object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    /// Kind of the referent
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// Namespace of the referent
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Name of the referent
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// API version of the referent
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
}

/// Reference to a Secret, possibly in another namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SecretReference {
    /// Secret name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Secret namespace
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// Labels and annotations carried by a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Labels copied onto objects created from the template
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Annotations copied onto objects created from the template
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// True when no labels or annotations are set.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.annotations.is_empty()
    }
}

/// A failure domain reported by the infrastructure cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FailureDomainSpec {
    /// Whether control plane machines may be placed here
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub control_plane: bool,

    /// Free-form attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Address assigned to a machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MachineAddress {
    /// Address type (`InternalIP`, `ExternalIP`, `Hostname`, ...)
    #[serde(rename = "type")]
    pub type_: String,

    /// The address
    pub address: String,
}
