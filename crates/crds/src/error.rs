//! API-level errors for the infrastructure types.

use thiserror::Error;

use crate::field::ErrorList;

/// Errors raised while registering, converting, defaulting or validating objects.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Validation failed with one or more field errors
    #[error("{}", format_invalid(.group_kind, .name, .errors))]
    Invalid {
        /// `Kind.group` of the rejected object
        group_kind: String,
        /// Object name
        name: String,
        /// All collected field errors
        errors: ErrorList,
    },

    /// A value in the source object has no representation in the target version
    #[error("Conversion error: value {value:?} of field {field} cannot be represented in {version}")]
    ConversionShapeMismatch {
        /// Field holding the value
        field: String,
        /// Offending value
        value: String,
        /// Target API version
        version: String,
    },

    /// The same (version, kind) pair was registered twice
    #[error("Duplicate registration: {0}")]
    DuplicateRegistration(String),

    /// Kind not known to the scheme
    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    /// Version not served for a known kind
    #[error("Unknown version {version} for kind {kind}")]
    UnknownVersion {
        /// Kind name
        kind: String,
        /// Requested API version
        version: String,
    },

    /// Object is missing required type information
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    /// CRD schema generation or merging failed
    #[error("Schema error: {0}")]
    Schema(String),

    /// SSH key generation failed
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Builds an `Invalid` error, or `Ok` when `errors` is empty.
    pub fn check(kind: &str, group: &str, name: &str, errors: ErrorList) -> Result<(), ApiError> {
        if errors.is_empty() {
            return Ok(());
        }
        Err(ApiError::Invalid {
            group_kind: format!("{kind}.{group}"),
            name: name.to_string(),
            errors,
        })
    }

    /// Field errors carried by an `Invalid` error.
    pub fn field_errors(&self) -> &[crate::field::FieldError] {
        match self {
            ApiError::Invalid { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn format_invalid(group_kind: &str, name: &str, errors: &ErrorList) -> String {
    let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
    if rendered.len() == 1 {
        format!("{group_kind} {name:?} is invalid: {}", rendered[0])
    } else {
        format!("{group_kind} {name:?} is invalid: [{}]", rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldError, FieldPath};

    #[test]
    fn test_check_empty_is_ok() {
        assert!(ApiError::check("AzureCluster", "infrastructure.cluster.x-k8s.io", "c", vec![]).is_ok());
    }

    #[test]
    fn test_invalid_message_lists_every_error() {
        let errors = vec![
            FieldError::required(&FieldPath::new("spec").child("a"), "a is required"),
            FieldError::forbidden(&FieldPath::new("spec").child("b"), "b is forbidden"),
        ];
        let err = ApiError::check("AzureCluster", "infrastructure.cluster.x-k8s.io", "c", errors)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("AzureCluster.infrastructure.cluster.x-k8s.io \"c\" is invalid: ["));
        assert!(msg.contains("spec.a: Required value: a is required"));
        assert!(msg.contains("spec.b: Forbidden: b is forbidden"));
        assert_eq!(err.field_errors().len(), 2);
    }
}
