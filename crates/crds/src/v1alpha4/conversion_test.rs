use pretty_assertions::assert_eq;
use serde_json::Value;

use super::*;
use crate::conversion::{Convertible, DATA_ANNOTATION};
use crate::test_utils::{
    create_defaulted_cluster, create_test_identity, create_test_machine,
    create_test_machine_template,
};
use crate::v1beta1;

fn ip_tag(type_: &str, tag: &str) -> v1beta1::IPTag {
    v1beta1::IPTag {
        type_: type_.to_string(),
        tag: tag.to_string(),
    }
}

fn nat_gateway(name: &str, tags: Vec<v1beta1::IPTag>) -> v1beta1::NatGateway {
    v1beta1::NatGateway {
        name: name.to_string(),
        nat_gateway_ip: v1beta1::PublicIPSpec {
            name: format!("pip-{name}"),
            ip_tags: tags,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_cluster_down_conversion_drops_hub_only_fields() {
    let mut hub = create_defaulted_cluster("foo");
    hub.spec.network_spec.api_server_lb.frontend_ips[0]
        .public_ip
        .as_mut()
        .unwrap()
        .ip_tags = vec![ip_tag("t", "v")];

    let spoke = AzureCluster::convert_from(&hub).unwrap();
    let json = serde_json::to_value(&spoke).unwrap();
    assert_eq!(json["apiVersion"], "infrastructure.cluster.x-k8s.io/v1alpha4");
    let frontend = &json["spec"]["networkSpec"]["apiServerLB"]["frontendIPs"][0];
    assert!(frontend["publicIP"].get("ipTags").is_none());
    assert!(spoke.metadata.annotations.as_ref().unwrap().contains_key(DATA_ANNOTATION));
    assert!(hub.metadata.annotations.is_none());
}

#[test]
fn test_cluster_lb_ip_tags_round_trip() {
    let mut hub = create_defaulted_cluster("foo");
    let frontend = &mut hub.spec.network_spec.api_server_lb.frontend_ips[0];
    frontend.public_ip.as_mut().unwrap().ip_tags = vec![ip_tag("t", "v")];
    let frontend_name = frontend.name.clone();

    let spoke = AzureCluster::convert_from(&hub).unwrap();
    let restored = spoke.convert_to().unwrap();

    let frontend = restored
        .spec
        .network_spec
        .api_server_lb
        .frontend_ips
        .iter()
        .find(|f| f.name == frontend_name)
        .unwrap();
    assert_eq!(frontend.public_ip.as_ref().unwrap().ip_tags, vec![ip_tag("t", "v")]);
    assert_eq!(restored.spec, hub.spec);
    assert!(restored.metadata.annotations.is_none());
}

#[test]
fn test_cluster_round_trip_restores_overrides_and_peerings() {
    let mut hub = create_defaulted_cluster("foo");
    hub.spec.cloud_provider_config_overrides = Some(v1beta1::CloudProviderConfigOverrides {
        rate_limits: vec![v1beta1::RateLimitSpec {
            name: "defaultRateLimit".to_string(),
            config: v1beta1::RateLimitConfig {
                cloud_provider_rate_limit: true,
                cloud_provider_rate_limit_bucket: Some(10),
                ..Default::default()
            },
        }],
        ..Default::default()
    });
    hub.spec.network_spec.vnet.peerings = vec![v1beta1::VnetPeeringSpec {
        resource_group: "other-rg".to_string(),
        remote_vnet_name: "other-vnet".to_string(),
    }];

    let restored = AzureCluster::convert_from(&hub).unwrap().convert_to().unwrap();
    assert_eq!(restored.spec, hub.spec);
}

#[test]
fn test_cluster_restore_matches_subnets_by_name() {
    let mut hub = create_defaulted_cluster("foo");
    let subnets = &mut hub.spec.network_spec.subnets;
    subnets[0].nat_gateway = nat_gateway("cp-natgw", vec![ip_tag("a", "1")]);
    subnets[1].nat_gateway = nat_gateway("node-natgw", vec![ip_tag("b", "2")]);

    let mut spoke = AzureCluster::convert_from(&hub).unwrap();
    spoke.spec.network_spec.subnets.reverse();
    let restored = spoke.convert_to().unwrap();

    let restored_subnets = &restored.spec.network_spec.subnets;
    assert_eq!(restored_subnets[0].name, hub.spec.network_spec.subnets[1].name);
    for subnet in &hub.spec.network_spec.subnets {
        let matched = restored_subnets.iter().find(|s| s.name == subnet.name).unwrap();
        assert_eq!(matched.nat_gateway, subnet.nat_gateway);
    }
}

#[test]
fn test_cluster_without_annotation_leaves_hub_fields_empty() {
    let spoke: AzureCluster = serde_json::from_value(serde_json::json!({
        "apiVersion": "infrastructure.cluster.x-k8s.io/v1alpha4",
        "kind": "AzureCluster",
        "metadata": {"name": "foo", "namespace": "default"},
        "spec": {
            "location": "westus2",
            "networkSpec": {
                "vnet": {"name": "foo-vnet"},
                "apiServerLB": {
                    "name": "foo-public-lb",
                    "frontendIPs": [{"name": "fe", "publicIP": {"name": "pip"}}]
                }
            }
        }
    }))
    .unwrap();

    let hub = spoke.convert_to().unwrap();
    assert_eq!(hub.spec.location, "westus2");
    assert!(hub.spec.cloud_provider_config_overrides.is_none());
    assert!(hub.spec.network_spec.vnet.peerings.is_empty());
    let frontend = &hub.spec.network_spec.api_server_lb.frontend_ips[0];
    assert!(frontend.public_ip.as_ref().unwrap().ip_tags.is_empty());
}

#[test]
fn test_bastion_nat_gateway_tags_dropped_on_rename() {
    let mut hub = create_defaulted_cluster("foo");
    let mut bastion = v1beta1::AzureBastion {
        name: "foo-azure-bastion".to_string(),
        public_ip: v1beta1::PublicIPSpec {
            name: "foo-azure-bastion-pip".to_string(),
            ip_tags: vec![ip_tag("pip", "x")],
            ..Default::default()
        },
        ..Default::default()
    };
    bastion.subnet.name = "AzureBastionSubnet".to_string();
    bastion.subnet.nat_gateway = nat_gateway("bastion-natgw", vec![ip_tag("nat", "y")]);
    hub.spec.bastion_spec.azure_bastion = Some(bastion);

    let restored = AzureCluster::convert_from(&hub).unwrap().convert_to().unwrap();
    assert_eq!(restored.spec, hub.spec);

    let mut spoke = AzureCluster::convert_from(&hub).unwrap();
    let spoke_bastion = spoke.spec.bastion_spec.azure_bastion.as_mut().unwrap();
    spoke_bastion.subnet.nat_gateway.name = "renamed-natgw".to_string();
    let restored = spoke.convert_to().unwrap();
    let restored_bastion = restored.spec.bastion_spec.azure_bastion.unwrap();
    assert_eq!(restored_bastion.public_ip.ip_tags, vec![ip_tag("pip", "x")]);
    assert!(restored_bastion.subnet.nat_gateway.nat_gateway_ip.ip_tags.is_empty());
}

#[test]
fn test_machine_round_trip_restores_gallery_plan_and_capabilities() {
    let mut hub = create_test_machine("m");
    hub.spec.image = Some(v1beta1::Image {
        shared_gallery: Some(v1beta1::AzureSharedGalleryImage {
            subscription_id: "sub".to_string(),
            resource_group: "rg".to_string(),
            gallery: "gallery".to_string(),
            name: "image".to_string(),
            version: "1.0.0".to_string(),
            publisher: Some("publisher".to_string()),
            offer: Some("offer".to_string()),
            sku: Some("sku".to_string()),
        }),
        ..Default::default()
    });
    hub.spec.additional_capabilities = Some(v1beta1::AdditionalCapabilities {
        ultra_ssd_enabled: Some(true),
    });

    let spoke = AzureMachine::convert_from(&hub).unwrap();
    let json = serde_json::to_value(&spoke).unwrap();
    assert!(json["spec"].get("additionalCapabilities").is_none());
    assert!(json["spec"]["image"]["sharedGallery"].get("publisher").is_none());

    let restored = spoke.convert_to().unwrap();
    assert_eq!(restored.spec, hub.spec);
}

#[test]
fn test_machine_template_restores_metadata() {
    let mut hub = create_test_machine_template("t");
    hub.spec
        .template
        .metadata
        .labels
        .insert("pool".to_string(), "gpu".to_string());

    let spoke = AzureMachineTemplate::convert_from(&hub).unwrap();
    let json = serde_json::to_value(&spoke).unwrap();
    assert!(json["spec"]["template"].get("metadata").is_none());

    let restored = spoke.convert_to().unwrap();
    assert_eq!(restored.spec, hub.spec);
}

#[test]
fn test_identity_round_trip() {
    let mut hub = create_test_identity("id", v1beta1::IdentityType::UserAssignedMSI);
    hub.spec.resource_id = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id".to_string();

    let spoke = AzureClusterIdentity::convert_from(&hub).unwrap();
    assert_eq!(spoke.spec.type_, v1beta1::IdentityType::UserAssignedMSI);
    let restored = spoke.convert_to().unwrap();
    assert_eq!(restored.spec, hub.spec);
}

#[test]
fn test_annotation_is_hub_json_without_metadata() {
    let hub = create_defaulted_cluster("foo");
    let spoke = AzureCluster::convert_from(&hub).unwrap();
    let data = &spoke.metadata.annotations.as_ref().unwrap()[DATA_ANNOTATION];
    let value: Value = serde_json::from_str(data).unwrap();
    assert_eq!(value["apiVersion"], "infrastructure.cluster.x-k8s.io/v1beta1");
    assert!(value.get("metadata").is_none());
}
