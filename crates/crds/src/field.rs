//! Field paths and field-level validation errors
//!
//! Mirrors the Kubernetes apimachinery field error model so admission
//! responses read the same as the ones produced by the API server:
//! - [`FieldPath`]: dotted path builder (`spec.networkSpec.subnets[0].name`)
//! - [`FieldError`]: a single typed error at a path
//! - [`ErrorList`]: the accumulated list returned by validators

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Path to a field inside an object, rendered as `a.b[0].c`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// Root path segment.
    pub fn new(root: &str) -> Self {
        Self(root.to_string())
    }

    /// Path to a named child field.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, name))
    }

    /// Path to a list element.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    /// Path to a map entry.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}[{}]", self.0, key))
    }

    /// Rendered path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorType {
    /// A required value was not provided.
    Required,
    /// The value is malformed or out of range.
    Invalid,
    /// The value is not one of the supported values.
    NotSupported,
    /// The value may not be set in this context.
    Forbidden,
    /// The value duplicates another entry in a list.
    Duplicate,
    /// The value exceeds its maximum length.
    TooLong,
}

impl ErrorType {
    fn description(self) -> &'static str {
        match self {
            ErrorType::Required => "Required value",
            ErrorType::Invalid => "Invalid value",
            ErrorType::NotSupported => "Unsupported value",
            ErrorType::Forbidden => "Forbidden",
            ErrorType::Duplicate => "Duplicate value",
            ErrorType::TooLong => "Too long",
        }
    }
}

/// A single validation error at a field path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Error kind
    pub error_type: ErrorType,

    /// Rendered field path
    pub field: String,

    /// The offending value, when one is relevant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bad_value: Option<Value>,

    /// Human-readable detail
    pub detail: String,

    /// Allowed values for `NotSupported` errors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supported_values: Vec<String>,
}

/// Accumulated validation errors.
pub type ErrorList = Vec<FieldError>;

fn to_bad_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

impl FieldError {
    /// A required value is missing.
    pub fn required(path: &FieldPath, detail: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::Required,
            field: path.to_string(),
            bad_value: None,
            detail: detail.into(),
            supported_values: Vec::new(),
        }
    }

    /// The value is invalid.
    pub fn invalid<T: Serialize + ?Sized>(
        path: &FieldPath,
        value: &T,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type: ErrorType::Invalid,
            field: path.to_string(),
            bad_value: Some(to_bad_value(value)),
            detail: detail.into(),
            supported_values: Vec::new(),
        }
    }

    /// The value is not among the supported values.
    pub fn not_supported<T: Serialize + ?Sized>(
        path: &FieldPath,
        value: &T,
        supported: &[&str],
    ) -> Self {
        let supported_values: Vec<String> = supported.iter().map(ToString::to_string).collect();
        let detail = if supported_values.is_empty() {
            String::new()
        } else {
            let quoted: Vec<String> = supported_values.iter().map(|s| format!("{s:?}")).collect();
            format!("supported values: {}", quoted.join(", "))
        };
        Self {
            error_type: ErrorType::NotSupported,
            field: path.to_string(),
            bad_value: Some(to_bad_value(value)),
            detail,
            supported_values,
        }
    }

    /// The field may not be set here.
    pub fn forbidden(path: &FieldPath, detail: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::Forbidden,
            field: path.to_string(),
            bad_value: None,
            detail: detail.into(),
            supported_values: Vec::new(),
        }
    }

    /// The value duplicates an earlier list entry.
    pub fn duplicate<T: Serialize + ?Sized>(path: &FieldPath, value: &T) -> Self {
        Self {
            error_type: ErrorType::Duplicate,
            field: path.to_string(),
            bad_value: Some(to_bad_value(value)),
            detail: String::new(),
            supported_values: Vec::new(),
        }
    }

    /// The value is longer than `max` characters.
    pub fn too_long<T: Serialize + ?Sized>(path: &FieldPath, value: &T, max: usize) -> Self {
        Self {
            error_type: ErrorType::TooLong,
            field: path.to_string(),
            bad_value: Some(to_bad_value(value)),
            detail: format!("must have at most {max} bytes"),
            supported_values: Vec::new(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error_type.description())?;
        match (&self.bad_value, self.error_type) {
            (Some(value), ErrorType::Invalid | ErrorType::NotSupported | ErrorType::Duplicate) => {
                write!(f, ": {value}")?;
            }
            _ => {}
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_rendering() {
        let path = FieldPath::new("spec")
            .child("networkSpec")
            .child("subnets")
            .index(2)
            .child("cidrBlocks")
            .index(0);
        assert_eq!(path.as_str(), "spec.networkSpec.subnets[2].cidrBlocks[0]");
        assert_eq!(FieldPath::new("spec").child("tags").key("env").to_string(), "spec.tags[env]");
    }

    #[test]
    fn test_display_matches_api_server_format() {
        let path = FieldPath::new("spec").child("ResourceGroup");
        let err = FieldError::invalid(&path, "new-rg", "field is immutable");
        assert_eq!(
            err.to_string(),
            "spec.ResourceGroup: Invalid value: \"new-rg\": field is immutable"
        );

        let err = FieldError::required(&FieldPath::new("spec").child("image"), "image is required");
        assert_eq!(err.to_string(), "spec.image: Required value: image is required");
    }

    #[test]
    fn test_not_supported_lists_values() {
        let path = FieldPath::new("spec").child("identity");
        let err = FieldError::not_supported(&path, "Magic", &["None", "SystemAssigned"]);
        assert_eq!(err.error_type, ErrorType::NotSupported);
        assert_eq!(err.supported_values, vec!["None", "SystemAssigned"]);
        assert!(err.to_string().contains("supported values: \"None\", \"SystemAssigned\""));
    }
}
