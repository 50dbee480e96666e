//! Uniform contract every resource spec implements
//!
//! Reconcilers hold a list of specs and, for each one, fetch the current
//! Azure state, call [`ResourceSpecGetter::parameters`] and issue a
//! create-or-update only when it returns `Some`.

use std::any::{Any, type_name};

use crate::error::SpecError;

/// Desired state of one Azure resource
pub trait ResourceSpecGetter {
    /// Azure-side parameter model produced by this spec
    type Parameters;

    /// Azure resource name
    fn resource_name(&self) -> &str;

    /// Name of the parent resource, or `""` for top-level resources
    fn owner_resource_name(&self) -> &str {
        ""
    }

    /// Resource group that owns the resource
    fn resource_group_name(&self) -> &str;

    /// Desired parameters given the observed ones.
    ///
    /// `existing` is `None` when the resource does not exist yet. `Ok(None)`
    /// means the existing resource needs no update.
    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<Self::Parameters>, SpecError>;
}

/// Downcasts the observed state to the model a spec reads.
pub fn existing_as<T: Any>(existing: Option<&dyn Any>) -> Result<Option<&T>, SpecError> {
    let Some(value) = existing else {
        return Ok(None);
    };
    value
        .downcast_ref::<T>()
        .map(Some)
        .ok_or_else(|| SpecError::ConflictingExistingShape {
            expected: short_type_name::<T>().to_string(),
            found: format!("{:?}", Any::type_id(value)),
        })
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RouteTable, VirtualNetwork};

    #[test]
    fn test_existing_as_none() {
        let existing = existing_as::<RouteTable>(None).unwrap();
        assert!(existing.is_none());
    }

    #[test]
    fn test_existing_as_wrong_type() {
        let vnet = VirtualNetwork::default();
        let err = existing_as::<RouteTable>(Some(&vnet)).unwrap_err();
        match err {
            SpecError::ConflictingExistingShape { expected, .. } => {
                assert_eq!(expected, "RouteTable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_existing_as_matching_type() {
        let table = RouteTable::default();
        let existing = existing_as::<RouteTable>(Some(&table)).unwrap();
        assert!(existing.is_some());
    }
}
