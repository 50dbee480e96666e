//! Azure resource tags and ownership markers

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Prefix shared by every tag this provider writes.
pub const NAME_AZURE_PROVIDER_PREFIX: &str = "sigs.k8s.io_cluster-api-provider-azure_";
/// Tag key recording a resource's role within the cluster.
pub const NAME_AZURE_CLUSTER_API_ROLE: &str = "sigs.k8s.io_cluster-api-provider-azure_role";
/// Tag key holding the resource name.
pub const NAME_TAG: &str = "Name";

/// Lifecycle value for resources owned by the cluster.
pub const RESOURCE_LIFECYCLE_OWNED: &str = "owned";
/// Lifecycle value for resources shared with other clusters.
pub const RESOURCE_LIFECYCLE_SHARED: &str = "shared";

/// Role tag value for the API server resources.
pub const API_SERVER_ROLE: &str = "apiserver";
/// Role tag value for node resources.
pub const NODE_OUTBOUND_ROLE: &str = "nodeOutbound";
/// Role tag value for control plane outbound resources.
pub const CONTROL_PLANE_OUTBOUND_ROLE: &str = "controlPlaneOutbound";
/// Role tag value for bastion resources.
pub const BASTION_ROLE: &str = "bastion";
/// Role tag value for common cluster resources.
pub const COMMON_ROLE: &str = "common";

/// Tag key marking a resource as belonging to `cluster`.
pub fn cluster_tag_key(cluster: &str) -> String {
    format!("{NAME_AZURE_PROVIDER_PREFIX}cluster_{cluster}")
}

/// Azure resource tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(transparent)]
pub struct Tags(pub BTreeMap<String, String>);

impl Tags {
    /// Empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no tags are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Inserts or replaces a tag.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// True when the tags mark the resource as owned by `cluster`.
    pub fn has_owned(&self, cluster: &str) -> bool {
        self.get(&cluster_tag_key(cluster)) == Some(RESOURCE_LIFECYCLE_OWNED)
    }

    /// Returns a copy with `other` layered on top.
    #[must_use]
    pub fn merge(&self, other: &Tags) -> Tags {
        let mut merged = self.clone();
        for (k, v) in &other.0 {
            merged.0.insert(k.clone(), v.clone());
        }
        merged
    }
}

impl FromIterator<(String, String)> for Tags {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Tags(iter.into_iter().collect())
    }
}

/// Inputs for building the tag set of a new resource.
#[derive(Debug, Clone, Default)]
pub struct BuildParams {
    /// Owning cluster
    pub cluster_name: String,
    /// `owned` or `shared`
    pub lifecycle: String,
    /// Resource name, written to the `Name` tag
    pub name: Option<String>,
    /// Resource role
    pub role: Option<String>,
    /// User-supplied tags
    pub additional: Tags,
}

/// Builds the tag set for a resource created by this provider.
pub fn build(params: &BuildParams) -> Tags {
    let mut tags = params.additional.clone();
    tags.insert(cluster_tag_key(&params.cluster_name), params.lifecycle.clone());
    if let Some(role) = &params.role {
        tags.insert(NAME_AZURE_CLUSTER_API_ROLE, role.clone());
    }
    if let Some(name) = &params.name {
        tags.insert(NAME_TAG, name.clone());
    }
    tags
}
