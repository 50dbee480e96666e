//! Route table spec

use std::any::Any;

use azure_crds::v1beta1::Tags;

use super::owned_tags;
use crate::error::SpecError;
use crate::models::{RouteTable, RouteTableProperties};
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Desired state of a route table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTableSpec {
    /// Route table name
    pub name: String,
    /// Cluster resource group
    pub resource_group: String,
    /// Azure region
    pub location: String,
    /// Owning cluster, used for the ownership tag
    pub cluster_name: String,
    /// Extra tags merged with the ownership tags
    pub additional_tags: Tags,
}

impl ResourceSpecGetter for RouteTableSpec {
    type Parameters = RouteTable;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<RouteTable>, SpecError> {
        // Routes are managed by the cloud provider, never by us.
        if existing_as::<RouteTable>(existing)?.is_some() {
            return Ok(None);
        }
        Ok(Some(RouteTable {
            location: self.location.clone(),
            tags: owned_tags(&self.cluster_name, &self.name, None, &self.additional_tags),
            properties: RouteTableProperties::default(),
        }))
    }
}
