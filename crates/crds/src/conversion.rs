//! Hub and spoke conversion
//!
//! Every spoke version converts only to and from the hub. Down-conversion
//! drops hub-only fields, so the full hub object (minus `metadata`) is
//! stored as JSON in an annotation on the spoke; up-conversion reads it
//! back and restores what the spoke could not carry.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::ApiError;
use crate::scheme::default_scheme;
use crate::{v1alpha3, v1alpha4, v1beta1};

/// Annotation holding the serialized hub on a spoke object.
pub const DATA_ANNOTATION: &str = "conversion.cluster.x-k8s.io/data-from-hub";

/// Marker for the version every conversion routes through.
pub trait Hub: Resource<DynamicType = ()> + Serialize + DeserializeOwned + Clone {}

impl Hub for v1beta1::AzureCluster {}
impl Hub for v1beta1::AzureMachine {}
impl Hub for v1beta1::AzureMachineTemplate {}
impl Hub for v1beta1::AzureClusterIdentity {}
impl Hub for v1beta1::AzureClusterTemplate {}

/// A spoke version of the hub kind `H`.
///
/// Neither direction mutates its input.
pub trait Convertible<H: Hub>: Sized {
    /// Up-converts to the hub, restoring hub-only fields from the annotation.
    fn convert_to(&self) -> Result<H, ApiError>;

    /// Down-converts from the hub and records the hub in the annotation.
    fn convert_from(hub: &H) -> Result<Self, ApiError>;
}

/// Stores `hub` (without its metadata) in `metadata`'s annotations.
pub fn marshal_data<H: Serialize>(hub: &H, metadata: &mut ObjectMeta) -> Result<(), ApiError> {
    let mut value = serde_json::to_value(hub)?;
    if let Value::Object(map) = &mut value {
        map.remove("metadata");
    }
    let data = serde_json::to_string(&value)?;
    metadata
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(DATA_ANNOTATION.to_string(), data);
    Ok(())
}

/// Reads the hub stored by [`marshal_data`], if any.
pub fn unmarshal_data<H: DeserializeOwned>(metadata: &ObjectMeta) -> Result<Option<H>, ApiError> {
    let Some(data) = metadata.annotations.as_ref().and_then(|a| a.get(DATA_ANNOTATION)) else {
        return Ok(None);
    };
    let mut value: Value = serde_json::from_str(data)?;
    if let Value::Object(map) = &mut value {
        map.entry("metadata").or_insert_with(|| Value::Object(Default::default()));
    }
    Ok(Some(serde_json::from_value(value)?))
}

/// Removes the conversion annotation, dropping an emptied annotation map.
pub fn strip_data(metadata: &mut ObjectMeta) {
    if let Some(annotations) = metadata.annotations.as_mut() {
        annotations.remove(DATA_ANNOTATION);
        if annotations.is_empty() {
            metadata.annotations = None;
        }
    }
}

/// Metadata for an up-converted hub: the spoke's, without the annotation.
pub(crate) fn hub_metadata(spoke: &ObjectMeta) -> ObjectMeta {
    let mut metadata = spoke.clone();
    strip_data(&mut metadata);
    metadata
}

/// Metadata for a down-converted spoke: the hub's, plus the annotation.
pub(crate) fn spoke_metadata<H: Hub>(hub: &H) -> Result<ObjectMeta, ApiError> {
    let mut metadata = hub.meta().clone();
    marshal_data(hub, &mut metadata)?;
    Ok(metadata)
}

/// Finds the item named `name` in `items`.
pub(crate) fn find_by_name<'a, T>(items: &'a [T], name: &str, key: impl Fn(&T) -> &str) -> Option<&'a T> {
    items.iter().find(|item| key(item) == name)
}

/// Error for a value with no counterpart in `version`.
pub(crate) fn shape_mismatch(field: &str, value: &str, version: &str) -> ApiError {
    ApiError::ConversionShapeMismatch {
        field: field.to_string(),
        value: value.to_string(),
        version: version.to_string(),
    }
}

/// Converts a raw object to `desired_api_version`, routing through the hub.
pub fn convert_object(object: &Value, desired_api_version: &str) -> Result<Value, ApiError> {
    let api_version = object
        .get("apiVersion")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::InvalidObject("missing apiVersion".to_string()))?;
    let kind = object
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::InvalidObject("missing kind".to_string()))?;

    let scheme = default_scheme().map_err(|e| ApiError::Schema(e.to_string()))?;
    let from = scheme.lookup(api_version, kind)?.version.clone();
    let to = scheme.lookup(desired_api_version, kind)?.version.clone();
    if from == to {
        return Ok(object.clone());
    }
    debug!("Converting {} from {} to {}", kind, from, to);

    match kind {
        "AzureCluster" => convert_kind::<v1beta1::AzureCluster, v1alpha4::AzureCluster, v1alpha3::AzureCluster>(
            object, &from, &to,
        ),
        "AzureMachine" => convert_kind::<v1beta1::AzureMachine, v1alpha4::AzureMachine, v1alpha3::AzureMachine>(
            object, &from, &to,
        ),
        "AzureMachineTemplate" => convert_kind::<
            v1beta1::AzureMachineTemplate,
            v1alpha4::AzureMachineTemplate,
            v1alpha3::AzureMachineTemplate,
        >(object, &from, &to),
        "AzureClusterIdentity" => convert_kind::<
            v1beta1::AzureClusterIdentity,
            v1alpha4::AzureClusterIdentity,
            v1alpha3::AzureClusterIdentity,
        >(object, &from, &to),
        other => Err(ApiError::UnknownKind(other.to_string())),
    }
}

fn convert_kind<H, A4, A3>(object: &Value, from: &str, to: &str) -> Result<Value, ApiError>
where
    H: Hub,
    A4: Convertible<H> + Serialize + DeserializeOwned,
    A3: Convertible<H> + Serialize + DeserializeOwned,
{
    let hub: H = match from {
        v1alpha4::VERSION => serde_json::from_value::<A4>(object.clone())?.convert_to()?,
        v1alpha3::VERSION => serde_json::from_value::<A3>(object.clone())?.convert_to()?,
        _ => serde_json::from_value(object.clone())?,
    };
    trace!("Converted {} to hub", H::kind(&()));
    let converted = match to {
        v1alpha4::VERSION => serde_json::to_value(A4::convert_from(&hub)?)?,
        v1alpha3::VERSION => serde_json::to_value(A3::convert_from(&hub)?)?,
        _ => serde_json::to_value(&hub)?,
    };
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_utils::create_defaulted_cluster;

    #[test]
    fn test_marshal_data_omits_metadata() {
        let mut cluster = create_defaulted_cluster("foo");
        cluster
            .metadata
            .labels
            .get_or_insert_with(BTreeMap::new)
            .insert("team".to_string(), "infra".to_string());
        let mut metadata = ObjectMeta::default();
        marshal_data(&cluster, &mut metadata).unwrap();

        let data = &metadata.annotations.as_ref().unwrap()[DATA_ANNOTATION];
        let value: Value = serde_json::from_str(data).unwrap();
        assert!(value.get("metadata").is_none());
        assert_eq!(value["kind"], "AzureCluster");
        assert_eq!(value["spec"]["networkSpec"]["apiServerLB"]["name"], "foo-public-lb");

        let restored: v1beta1::AzureCluster = unmarshal_data(&metadata).unwrap().unwrap();
        assert_eq!(restored.spec, cluster.spec);
    }

    #[test]
    fn test_unmarshal_without_annotation() {
        let restored: Option<v1beta1::AzureCluster> = unmarshal_data(&ObjectMeta::default()).unwrap();
        assert!(restored.is_none());
    }

    #[test]
    fn test_strip_data_drops_empty_map() {
        let mut metadata = ObjectMeta::default();
        marshal_data(&json!({"spec": {}}), &mut metadata).unwrap();
        strip_data(&mut metadata);
        assert!(metadata.annotations.is_none());

        let mut metadata = ObjectMeta {
            annotations: Some(BTreeMap::from([("keep".to_string(), "me".to_string())])),
            ..Default::default()
        };
        marshal_data(&json!({"spec": {}}), &mut metadata).unwrap();
        strip_data(&mut metadata);
        assert_eq!(metadata.annotations.unwrap().len(), 1);
    }

    #[test]
    fn test_convert_object_round_trip() {
        let cluster = create_defaulted_cluster("foo");
        let hub = serde_json::to_value(&cluster).unwrap();

        let spoke = convert_object(&hub, "infrastructure.cluster.x-k8s.io/v1alpha3").unwrap();
        assert_eq!(spoke["apiVersion"], "infrastructure.cluster.x-k8s.io/v1alpha3");
        assert!(spoke["spec"]["networkSpec"].get("nodeOutboundLB").is_none());
        assert!(spoke["metadata"]["annotations"][DATA_ANNOTATION].is_string());

        let back = convert_object(&spoke, "infrastructure.cluster.x-k8s.io/v1beta1").unwrap();
        let back: v1beta1::AzureCluster = serde_json::from_value(back).unwrap();
        assert_eq!(back.spec, cluster.spec);
        assert!(back.metadata.annotations.is_none());
    }

    #[test]
    fn test_convert_object_spoke_to_spoke() {
        let cluster = create_defaulted_cluster("foo");
        let hub = serde_json::to_value(&cluster).unwrap();
        let v3 = convert_object(&hub, "infrastructure.cluster.x-k8s.io/v1alpha3").unwrap();
        let v4 = convert_object(&v3, "infrastructure.cluster.x-k8s.io/v1alpha4").unwrap();
        assert_eq!(v4["apiVersion"], "infrastructure.cluster.x-k8s.io/v1alpha4");
        assert_eq!(v4["spec"]["networkSpec"]["nodeOutboundLB"]["name"], "foo");
    }

    #[test]
    fn test_convert_object_rejects_unknown() {
        let object = json!({"apiVersion": "infrastructure.cluster.x-k8s.io/v1beta1", "kind": "AzureManagedCluster"});
        assert!(matches!(
            convert_object(&object, "infrastructure.cluster.x-k8s.io/v1alpha4"),
            Err(ApiError::UnknownKind(_))
        ));
        let object = json!({"kind": "AzureCluster"});
        assert!(matches!(
            convert_object(&object, "infrastructure.cluster.x-k8s.io/v1alpha4"),
            Err(ApiError::InvalidObject(_))
        ));
    }
}
