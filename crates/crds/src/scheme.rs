//! Schema registry
//!
//! Maps `(group, version, kind)` to a registered Rust type and records
//! which version of each kind is the hub. Built once at start-up and
//! read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::crd::merge_crds;
use kube::{CustomResourceExt, Resource};
use tracing::debug;

use crate::error::ApiError;
use crate::{v1alpha3, v1alpha4, v1beta1};

/// Fully qualified type identity of a registered kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupVersionKind {
    /// API group
    pub group: String,
    /// Version within the group
    pub version: String,
    /// Kind name
    pub kind: String,
}

impl GroupVersionKind {
    /// `group/version` string used in `apiVersion`.
    pub fn api_version(&self) -> String {
        format!("{}/{}", self.group, self.version)
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
    }
}

#[derive(Debug, Clone)]
struct Registration {
    gvk: GroupVersionKind,
    hub: bool,
    crd: CustomResourceDefinition,
}

/// Registration table of every served kind and version.
#[derive(Debug, Clone, Default)]
pub struct Scheme {
    kinds: BTreeMap<String, Vec<Registration>>,
}

impl Scheme {
    /// Empty scheme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `K`, marking it as the hub of its kind when `hub` is set.
    ///
    /// Fails on a repeated `(group, version, kind)` or a second hub.
    pub fn register<K>(&mut self, hub: bool) -> Result<(), ApiError>
    where
        K: Resource<DynamicType = ()> + CustomResourceExt,
    {
        let gvk = GroupVersionKind {
            group: K::group(&()).into_owned(),
            version: K::version(&()).into_owned(),
            kind: K::kind(&()).into_owned(),
        };
        let versions = self.kinds.entry(gvk.kind.clone()).or_default();
        if versions.iter().any(|r| r.gvk == gvk) {
            return Err(ApiError::DuplicateRegistration(gvk.to_string()));
        }
        if hub {
            if let Some(existing) = versions.iter().find(|r| r.hub) {
                return Err(ApiError::DuplicateRegistration(format!(
                    "{gvk}: hub already registered as {}",
                    existing.gvk.version
                )));
            }
        }
        debug!("Registered {} (hub: {})", gvk, hub);
        versions.push(Registration { gvk, hub, crd: K::crd() });
        Ok(())
    }

    /// True when `version` is the hub of `kind`.
    pub fn is_hub(&self, kind: &str, version: &str) -> bool {
        self.registrations(kind)
            .iter()
            .any(|r| r.hub && r.gvk.version == version)
    }

    /// Every registered version of `kind`, in registration order.
    pub fn versions(&self, kind: &str) -> Vec<&str> {
        self.registrations(kind)
            .iter()
            .map(|r| r.gvk.version.as_str())
            .collect()
    }

    /// Hub version of `kind`.
    pub fn hub_version(&self, kind: &str) -> Option<&str> {
        self.registrations(kind)
            .iter()
            .find(|r| r.hub)
            .map(|r| r.gvk.version.as_str())
    }

    /// Registered kind names.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Resolves an `apiVersion` and kind to a registered type.
    pub fn lookup(&self, api_version: &str, kind: &str) -> Result<&GroupVersionKind, ApiError> {
        let registrations = self
            .kinds
            .get(kind)
            .ok_or_else(|| ApiError::UnknownKind(kind.to_string()))?;
        registrations
            .iter()
            .map(|r| &r.gvk)
            .find(|gvk| gvk.api_version() == api_version)
            .ok_or_else(|| ApiError::UnknownVersion {
                kind: kind.to_string(),
                version: api_version.to_string(),
            })
    }

    /// Multi-version CRD for `kind`, stored at the hub version.
    pub fn crd(&self, kind: &str) -> Result<CustomResourceDefinition, ApiError> {
        let registrations = self
            .kinds
            .get(kind)
            .ok_or_else(|| ApiError::UnknownKind(kind.to_string()))?;
        let hub = self
            .hub_version(kind)
            .ok_or_else(|| ApiError::Schema(format!("no hub version registered for {kind}")))?;
        let crds = registrations.iter().map(|r| r.crd.clone()).collect();
        merge_crds(crds, hub).map_err(|e| ApiError::Schema(e.to_string()))
    }

    /// Merged CRDs of every registered kind.
    pub fn crds(&self) -> Result<Vec<CustomResourceDefinition>, ApiError> {
        self.kinds().map(|kind| self.crd(kind)).collect()
    }

    fn registrations(&self, kind: &str) -> &[Registration] {
        self.kinds.get(kind).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Scheme with every served kind and version registered.
pub fn build_scheme() -> Result<Scheme, ApiError> {
    let mut scheme = Scheme::new();

    scheme.register::<v1beta1::AzureCluster>(true)?;
    scheme.register::<v1beta1::AzureMachine>(true)?;
    scheme.register::<v1beta1::AzureMachineTemplate>(true)?;
    scheme.register::<v1beta1::AzureClusterIdentity>(true)?;
    scheme.register::<v1beta1::AzureClusterTemplate>(true)?;

    scheme.register::<v1alpha4::AzureCluster>(false)?;
    scheme.register::<v1alpha4::AzureMachine>(false)?;
    scheme.register::<v1alpha4::AzureMachineTemplate>(false)?;
    scheme.register::<v1alpha4::AzureClusterIdentity>(false)?;

    scheme.register::<v1alpha3::AzureCluster>(false)?;
    scheme.register::<v1alpha3::AzureMachine>(false)?;
    scheme.register::<v1alpha3::AzureMachineTemplate>(false)?;
    scheme.register::<v1alpha3::AzureClusterIdentity>(false)?;

    Ok(scheme)
}

static DEFAULT_SCHEME: LazyLock<Result<Scheme, ApiError>> = LazyLock::new(build_scheme);

/// Process-wide scheme, built on first use.
pub fn default_scheme() -> Result<&'static Scheme, &'static ApiError> {
    DEFAULT_SCHEME.as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheme_versions() {
        let scheme = default_scheme().unwrap();
        assert_eq!(scheme.versions("AzureCluster"), vec!["v1beta1", "v1alpha4", "v1alpha3"]);
        assert_eq!(scheme.hub_version("AzureMachine"), Some("v1beta1"));
        assert!(scheme.is_hub("AzureMachineTemplate", "v1beta1"));
        assert!(!scheme.is_hub("AzureMachineTemplate", "v1alpha4"));
        assert_eq!(scheme.versions("AzureClusterTemplate"), vec!["v1beta1"]);
        assert_eq!(scheme.kinds().count(), 5);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut scheme = Scheme::new();
        scheme.register::<v1beta1::AzureCluster>(true).unwrap();
        let err = scheme.register::<v1beta1::AzureCluster>(true).unwrap_err();
        assert!(matches!(err, ApiError::DuplicateRegistration(_)));
        assert_eq!(scheme.versions("AzureCluster"), vec!["v1beta1"]);
    }

    #[test]
    fn test_second_hub_fails() {
        let mut scheme = Scheme::new();
        scheme.register::<v1beta1::AzureMachine>(true).unwrap();
        let err = scheme.register::<v1alpha4::AzureMachine>(true).unwrap_err();
        assert!(err.to_string().contains("hub already registered as v1beta1"), "{err}");
        scheme.register::<v1alpha4::AzureMachine>(false).unwrap();
    }

    #[test]
    fn test_lookup() {
        let scheme = default_scheme().unwrap();
        let gvk = scheme
            .lookup("infrastructure.cluster.x-k8s.io/v1alpha3", "AzureMachine")
            .unwrap();
        assert_eq!(gvk.version, "v1alpha3");
        assert!(matches!(
            scheme.lookup("infrastructure.cluster.x-k8s.io/v1alpha1", "AzureMachine"),
            Err(ApiError::UnknownVersion { .. })
        ));
        assert!(matches!(
            scheme.lookup("infrastructure.cluster.x-k8s.io/v1beta1", "AzureManagedCluster"),
            Err(ApiError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_merged_crd_stores_hub() {
        let scheme = default_scheme().unwrap();
        let crd = scheme.crd("AzureCluster").unwrap();
        assert_eq!(crd.spec.names.kind, "AzureCluster");
        let versions: Vec<(&str, bool)> = crd
            .spec
            .versions
            .iter()
            .map(|v| (v.name.as_str(), v.storage))
            .collect();
        assert_eq!(versions.len(), 3);
        assert!(versions.contains(&("v1beta1", true)));
        assert!(versions.contains(&("v1alpha3", false)));
    }
}
