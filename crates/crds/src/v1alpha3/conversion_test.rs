use pretty_assertions::assert_eq;

use super::*;
use crate::conversion::Convertible;
use crate::error::ApiError;
use crate::test_utils::{create_defaulted_cluster, create_test_identity, create_test_machine};
use crate::v1beta1;

fn private_cluster(name: &str) -> v1beta1::AzureCluster {
    let mut cluster = crate::test_utils::create_test_cluster(name);
    cluster.spec.network_spec.api_server_lb.type_ = v1beta1::LB_TYPE_INTERNAL.to_string();
    cluster.spec.network_spec.control_plane_outbound_lb = Some(v1beta1::LoadBalancerSpec {
        frontend_ips_count: Some(1),
        ..Default::default()
    });
    cluster.spec.network_spec.private_dns_zone_name = format!("{name}.capz.io");
    crate::webhook::Defaulter::set_defaults(&mut cluster).unwrap();
    cluster
}

#[test]
fn test_cluster_round_trip_restores_outbound_lbs() {
    let hub = create_defaulted_cluster("foo");
    assert!(hub.spec.network_spec.node_outbound_lb.is_some());

    let spoke = AzureCluster::convert_from(&hub).unwrap();
    let json = serde_json::to_value(&spoke).unwrap();
    let network = &json["spec"]["networkSpec"];
    assert!(network.get("nodeOutboundLB").is_none());
    assert!(network["apiServerLB"].get("idleTimeoutInMinutes").is_none());
    assert!(json["spec"].get("bastionSpec").is_none());

    let restored = spoke.convert_to().unwrap();
    assert_eq!(restored.spec, hub.spec);
}

#[test]
fn test_private_cluster_round_trip() {
    let hub = private_cluster("foo");
    assert!(hub.spec.network_spec.control_plane_outbound_lb.is_some());
    assert!(!hub.spec.network_spec.private_dns_zone_name.is_empty());

    let restored = AzureCluster::convert_from(&hub).unwrap().convert_to().unwrap();
    assert_eq!(restored.spec, hub.spec);
}

#[test]
fn test_nat_gateways_restored_by_subnet_name() {
    let mut hub = create_defaulted_cluster("foo");
    hub.spec.network_spec.subnets[1].nat_gateway = v1beta1::NatGateway {
        name: "node-natgw".to_string(),
        nat_gateway_ip: v1beta1::PublicIPSpec {
            name: "pip-node-natgw".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let mut spoke = AzureCluster::convert_from(&hub).unwrap();
    spoke.spec.network_spec.subnets.reverse();
    let restored = spoke.convert_to().unwrap();

    let node_subnet = &hub.spec.network_spec.subnets[1];
    let subnets = &restored.spec.network_spec.subnets;
    assert_eq!(subnets[0].name, node_subnet.name);
    assert_eq!(subnets[0].nat_gateway, node_subnet.nat_gateway);
    assert_eq!(subnets[1].nat_gateway, v1beta1::NatGateway::default());
}

#[test]
fn test_cluster_subnet_role_cannot_down_convert() {
    let mut hub = create_defaulted_cluster("foo");
    hub.spec.network_spec.subnets[0].role = Some(v1beta1::SubnetRole::Cluster);

    let err = AzureCluster::convert_from(&hub).unwrap_err();
    match err {
        ApiError::ConversionShapeMismatch { field, value, version } => {
            assert_eq!(field, "spec.networkSpec.subnets.role");
            assert_eq!(value, "cluster");
            assert_eq!(version, "v1alpha3");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_spoke_without_annotation() {
    let spoke: AzureCluster = serde_json::from_value(serde_json::json!({
        "apiVersion": "infrastructure.cluster.x-k8s.io/v1alpha3",
        "kind": "AzureCluster",
        "metadata": {"name": "foo"},
        "spec": {
            "location": "eastus",
            "networkSpec": {
                "subnets": [
                    {"role": "control-plane", "name": "foo-controlplane-subnet"},
                    {"role": "node", "name": "foo-node-subnet"}
                ]
            }
        }
    }))
    .unwrap();

    let hub = spoke.convert_to().unwrap();
    let network = &hub.spec.network_spec;
    assert!(network.node_outbound_lb.is_none());
    assert!(hub.spec.bastion_spec.azure_bastion.is_none());
    assert_eq!(network.subnets[1].role, Some(v1beta1::SubnetRole::Node));
    assert!(!network.subnets[1].is_nat_gateway_enabled());
}

#[test]
fn test_machine_round_trip_restores_caching_and_security_profile() {
    let mut hub = create_test_machine("m");
    hub.spec.security_profile = Some(v1beta1::SecurityProfile {
        encryption_at_host: Some(true),
    });
    hub.spec.data_disks = vec![
        v1beta1::DataDisk {
            name_suffix: "etcddisk".to_string(),
            disk_size_gb: 256,
            lun: Some(0),
            caching_type: v1beta1::CACHING_TYPE_READ_ONLY.to_string(),
            ..Default::default()
        },
        v1beta1::DataDisk {
            name_suffix: "scratch".to_string(),
            disk_size_gb: 64,
            lun: Some(1),
            caching_type: v1beta1::CACHING_TYPE_NONE.to_string(),
            ..Default::default()
        },
    ];

    let mut spoke = AzureMachine::convert_from(&hub).unwrap();
    let json = serde_json::to_value(&spoke).unwrap();
    assert!(json["spec"].get("securityProfile").is_none());
    assert!(json["spec"]["dataDisks"][0].get("cachingType").is_none());

    let restored = spoke.convert_to().unwrap();
    assert_eq!(restored.spec, hub.spec);

    spoke.spec.data_disks.reverse();
    let restored = spoke.convert_to().unwrap();
    assert_eq!(restored.spec.data_disks[0].name_suffix, "scratch");
    assert_eq!(restored.spec.data_disks[0].caching_type, v1beta1::CACHING_TYPE_NONE);
    assert_eq!(restored.spec.data_disks[1].caching_type, v1beta1::CACHING_TYPE_READ_ONLY);
}

#[test]
fn test_manual_service_principal_has_no_hub_counterpart() {
    let hub = create_test_identity("id", v1beta1::IdentityType::ServicePrincipal);
    let mut spoke = AzureClusterIdentity::convert_from(&hub).unwrap();
    assert_eq!(spoke.spec.type_, IdentityType::ServicePrincipal);
    assert_eq!(spoke.convert_to().unwrap().spec, hub.spec);

    spoke.spec.type_ = IdentityType::ManualServicePrincipal;
    let err = spoke.convert_to().unwrap_err();
    assert!(matches!(err, ApiError::ConversionShapeMismatch { .. }));
    assert!(err.to_string().contains("ManualServicePrincipal"), "{err}");
}
