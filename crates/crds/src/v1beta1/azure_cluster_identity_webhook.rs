//! AzureClusterIdentity defaulting and validation

use kube::ResourceExt;
use tracing::debug;

use super::azure_cluster_identity::{AzureClusterIdentity, AzureClusterIdentitySpec, IdentityType};
use crate::GROUP;
use crate::error::ApiError;
use crate::field::{ErrorList, FieldError, FieldPath};
use crate::webhook::{Defaulter, Validator};

impl Defaulter for AzureClusterIdentity {
    fn set_defaults(&mut self) -> Result<(), ApiError> {
        Ok(())
    }
}

impl Validator for AzureClusterIdentity {
    fn validate_create(&self) -> Result<(), ApiError> {
        let name = self.name_any();
        let errs = validate_identity_spec(&self.spec);
        debug!("AzureClusterIdentity {} create validation found {} errors", name, errs.len());
        ApiError::check("AzureClusterIdentity", GROUP, &name, errs)
    }

    fn validate_update(&self, old: &Self) -> Result<(), ApiError> {
        let name = self.name_any();
        let mut errs = validate_identity_spec(&self.spec);
        if old.spec.type_ != self.spec.type_ {
            errs.push(FieldError::invalid(&FieldPath::new("spec").child("Type"), &self.spec.type_, "field is immutable"));
        }
        ApiError::check("AzureClusterIdentity", GROUP, &name, errs)
    }
}

/// Credential fields required per identity type.
pub fn validate_identity_spec(spec: &AzureClusterIdentitySpec) -> ErrorList {
    let mut errs = ErrorList::new();
    let path = FieldPath::new("spec");
    if spec.type_ != IdentityType::UserAssignedMSI && !spec.resource_id.is_empty() {
        errs.push(FieldError::forbidden(
            &path.child("resourceID"),
            "resourceID is only allowed for the UserAssignedMSI identity type",
        ));
    }
    if spec.client_id.is_empty() {
        errs.push(FieldError::required(&path.child("clientID"), "clientID is required"));
    }
    if spec.tenant_id.is_empty() {
        errs.push(FieldError::required(&path.child("tenantID"), "tenantID is required"));
    }
    errs
}
