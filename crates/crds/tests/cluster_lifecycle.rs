//! End-to-end admission and conversion flows over the public API.

use azure_crds::conversion::{DATA_ANNOTATION, convert_object};
use azure_crds::v1beta1::{AzureCluster, AzureClusterSpec, IPTag, LB_TYPE_INTERNAL};
use azure_crds::{ApiError, Defaulter, ErrorType, Validator, default_scheme};
use ipnet::IpNet;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use pretty_assertions::assert_eq;
use serde_json::json;

const V1BETA1: &str = "infrastructure.cluster.x-k8s.io/v1beta1";
const V1ALPHA4: &str = "infrastructure.cluster.x-k8s.io/v1alpha4";
const V1ALPHA3: &str = "infrastructure.cluster.x-k8s.io/v1alpha3";

fn new_cluster(name: &str) -> AzureCluster {
    AzureCluster {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        },
        spec: AzureClusterSpec {
            location: "eastus".to_string(),
            ..Default::default()
        },
        status: None,
    }
}

fn admit(mut cluster: AzureCluster) -> AzureCluster {
    cluster.set_defaults().unwrap();
    cluster.validate_create().unwrap();
    cluster
}

#[test]
fn test_empty_cluster_defaulting() {
    let cluster = admit(new_cluster("foo"));
    let spec = &cluster.spec;
    let network = &spec.network_spec;

    assert_eq!(spec.resource_group, "foo");
    assert_eq!(network.vnet.name, "foo-vnet");
    assert_eq!(network.vnet.cidr_blocks, vec!["10.0.0.0/8".to_string()]);

    let subnets: Vec<(&str, &str)> = network
        .subnets
        .iter()
        .map(|s| (s.name.as_str(), s.cidr_blocks[0].as_str()))
        .collect();
    assert_eq!(
        subnets,
        vec![("foo-controlplane-subnet", "10.0.0.0/16"), ("foo-node-subnet", "10.1.0.0/16")]
    );

    let api_lb = &network.api_server_lb;
    assert_eq!(api_lb.name, "foo-public-lb");
    assert_eq!(api_lb.sku, "Standard");
    assert_eq!(api_lb.type_, "Public");
    assert_eq!(api_lb.idle_timeout_in_minutes, Some(4));
    assert_eq!(api_lb.frontend_ips.len(), 1);
    assert_eq!(api_lb.frontend_ips[0].name, "foo-public-lb-frontEnd");
    assert_eq!(api_lb.frontend_ips[0].public_ip.as_ref().unwrap().name, "pip-foo-apiserver");

    let node_lb = network.node_outbound_lb.as_ref().unwrap();
    assert_eq!(node_lb.name, "foo");
    assert_eq!(node_lb.frontend_ips[0].name, "foo-frontEnd");
    assert_eq!(
        node_lb.frontend_ips[0].public_ip.as_ref().unwrap().name,
        "pip-foo-node-outbound"
    );
    assert_eq!(node_lb.idle_timeout_in_minutes, Some(4));

    assert!(network.control_plane_outbound_lb.is_none());
    assert!(spec.bastion_spec.azure_bastion.is_none());
}

#[test]
fn test_internal_cluster_defaulting() {
    let mut cluster = new_cluster("foo");
    cluster.spec.network_spec.api_server_lb.type_ = LB_TYPE_INTERNAL.to_string();
    let cluster = admit(cluster);

    let api_lb = &cluster.spec.network_spec.api_server_lb;
    assert_eq!(api_lb.name, "foo-internal-lb");
    assert_eq!(api_lb.frontend_ips[0].private_ip_address, "10.0.0.100");
    assert!(cluster.spec.network_spec.node_outbound_lb.is_none());
}

#[test]
fn test_accepted_cluster_invariants() {
    let cluster = admit(new_cluster("foo"));
    let network = &cluster.spec.network_spec;

    let vnet_cidrs: Vec<IpNet> = network
        .vnet
        .cidr_blocks
        .iter()
        .map(|c| c.parse().unwrap())
        .collect();
    for subnet in &network.subnets {
        for cidr in &subnet.cidr_blocks {
            let cidr: IpNet = cidr.parse().unwrap();
            assert!(
                vnet_cidrs.iter().any(|v| v.contains(&cidr)),
                "{cidr} outside the vnet"
            );
        }
    }

    let mut names: Vec<&str> = network.subnets.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), network.subnets.len());

    let every_node_subnet_has_nat = network.node_subnets().all(|s| s.is_nat_gateway_enabled());
    assert!(network.node_outbound_lb.is_some() || every_node_subnet_has_nat);
}

#[test]
fn test_unmanaged_vnet_missing_control_plane_subnet() {
    let mut cluster = new_cluster("foo");
    cluster.spec.network_spec.vnet.resource_group = "custom".to_string();
    cluster.spec.network_spec.vnet.name = "my-vnet".to_string();
    cluster.spec.network_spec.subnets =
        serde_json::from_value(json!([{"name": "node", "role": "node"}])).unwrap();

    let err = cluster.validate_create().unwrap_err();
    assert!(
        err.field_errors().iter().any(|e| e.error_type == ErrorType::Required
            && e.field == "spec.networkSpec.subnets"
            && e.detail.contains("required role control-plane not included")),
        "{err}"
    );
}

#[test]
fn test_update_rejects_resource_group_change() {
    let old = admit(new_cluster("foo"));
    let mut new = old.clone();
    new.spec.resource_group = "bar".to_string();

    let err = new.validate_update(&old).unwrap_err();
    let errors = err.field_errors();
    assert_eq!(errors.len(), 1, "{err}");
    assert_eq!(errors[0].error_type, ErrorType::Invalid);
    assert_eq!(errors[0].field, "spec.ResourceGroup");
    assert_eq!(errors[0].detail, "field is immutable");
}

#[test]
fn test_stored_cluster_served_to_old_clients() {
    let mut cluster = admit(new_cluster("foo"));
    cluster.spec.network_spec.api_server_lb.frontend_ips[0]
        .public_ip
        .as_mut()
        .unwrap()
        .ip_tags = vec![IPTag {
        type_: "t".to_string(),
        tag: "v".to_string(),
    }];
    let stored = serde_json::to_value(&cluster).unwrap();

    let v4 = convert_object(&stored, V1ALPHA4).unwrap();
    assert_eq!(v4["apiVersion"], V1ALPHA4);
    assert!(v4["metadata"]["annotations"][DATA_ANNOTATION].is_string());

    let v3 = convert_object(&v4, V1ALPHA3).unwrap();
    assert_eq!(v3["apiVersion"], V1ALPHA3);

    let back: AzureCluster = serde_json::from_value(convert_object(&v3, V1BETA1).unwrap()).unwrap();
    assert_eq!(back.spec, cluster.spec);
    assert!(back.metadata.annotations.is_none());

    back.validate_update(&cluster).unwrap();
}

#[test]
fn test_same_version_conversion_is_identity() {
    let stored = serde_json::to_value(admit(new_cluster("foo"))).unwrap();
    assert_eq!(convert_object(&stored, V1BETA1).unwrap(), stored);
}

#[test]
fn test_cluster_subnet_cannot_reach_v1alpha3() {
    let mut cluster = new_cluster("foo");
    cluster.spec.network_spec.subnets = serde_json::from_value(json!([{"role": "cluster"}])).unwrap();
    cluster.set_defaults().unwrap();
    let stored = serde_json::to_value(&cluster).unwrap();

    convert_object(&stored, V1ALPHA4).unwrap();
    let err = convert_object(&stored, V1ALPHA3).unwrap_err();
    assert!(matches!(err, ApiError::ConversionShapeMismatch { .. }), "{err}");
}

#[test]
fn test_scheme_serves_every_kind() {
    let scheme = default_scheme().unwrap();
    let crds = scheme.crds().unwrap();
    let kinds: Vec<&str> = crds.iter().map(|c| c.spec.names.kind.as_str()).collect();
    assert_eq!(
        kinds,
        vec![
            "AzureCluster",
            "AzureClusterIdentity",
            "AzureClusterTemplate",
            "AzureMachine",
            "AzureMachineTemplate"
        ]
    );
    for crd in &crds {
        let storage: Vec<&str> = crd
            .spec
            .versions
            .iter()
            .filter(|v| v.storage)
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(storage, vec!["v1beta1"], "{}", crd.spec.names.kind);
    }
}
