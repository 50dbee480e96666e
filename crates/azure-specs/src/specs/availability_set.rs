//! Availability set spec
//!
//! Machines of a node group share one availability set when the region
//! offers no availability zones.

use std::any::Any;

use azure_crds::v1beta1::Tags;

use super::owned_tags;
use crate::error::SpecError;
use crate::models::{AvailabilitySet, AvailabilitySetProperties, Sku};
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Update domains per availability set.
pub const UPDATE_DOMAIN_COUNT: i32 = 5;
/// SKU required for managed disks.
pub const ALIGNED_SKU: &str = "Aligned";

/// Desired availability set of a node group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilitySetSpec {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    /// Region limit, looked up by the caller
    pub fault_domain_count: i32,
    pub cluster_name: String,
    pub additional_tags: Tags,
}

impl ResourceSpecGetter for AvailabilitySetSpec {
    type Parameters = AvailabilitySet;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<AvailabilitySet>, SpecError> {
        if existing_as::<AvailabilitySet>(existing)?.is_some() {
            return Ok(None);
        }
        if self.fault_domain_count <= 0 {
            return Err(SpecError::MissingParameter(format!(
                "fault domain count of availability set {}",
                self.name
            )));
        }
        Ok(Some(AvailabilitySet {
            location: self.location.clone(),
            tags: owned_tags(&self.cluster_name, &self.name, None, &self.additional_tags),
            sku: Sku::new(ALIGNED_SKU),
            properties: AvailabilitySetProperties {
                platform_fault_domain_count: self.fault_domain_count,
                platform_update_domain_count: UPDATE_DOMAIN_COUNT,
            },
        }))
    }
}
