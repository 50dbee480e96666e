//! Admission hooks
//!
//! Every hub kind implements both traits; the webhook server dispatches
//! admission requests to them by kind.

use crate::error::ApiError;

/// Mutating admission: fill unset fields in place.
///
/// Implementations must be idempotent.
pub trait Defaulter {
    /// Applies defaults to `self`.
    fn set_defaults(&mut self) -> Result<(), ApiError>;
}

/// Validating admission.
///
/// Every rule is evaluated; an `Err` carries the full list of field errors.
pub trait Validator {
    /// Rules for a newly created object.
    fn validate_create(&self) -> Result<(), ApiError>;

    /// Rules for an update from `old` to `self`, including immutability.
    fn validate_update(&self, old: &Self) -> Result<(), ApiError>;

    /// Rules for deletion.
    fn validate_delete(&self) -> Result<(), ApiError> {
        Ok(())
    }
}
