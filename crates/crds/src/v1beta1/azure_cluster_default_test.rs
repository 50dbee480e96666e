//! Unit tests for AzureCluster defaulting

use pretty_assertions::assert_eq;

use super::*;
use crate::test_utils::create_test_cluster;
use crate::webhook::Defaulter;

#[test]
fn test_empty_cluster_defaults() {
    let mut cluster = create_test_cluster("foo");
    cluster.set_defaults().unwrap();
    let spec = &cluster.spec;
    let net = &spec.network_spec;

    assert_eq!(spec.resource_group, "foo");
    assert_eq!(spec.azure_environment, AZURE_PUBLIC_CLOUD);
    assert_eq!(net.vnet.name, "foo-vnet");
    assert_eq!(net.vnet.resource_group, "foo");
    assert_eq!(net.vnet.cidr_blocks, vec!["10.0.0.0/8"]);

    assert_eq!(net.subnets.len(), 2, "Should append control plane and node subnets");
    let cp = &net.subnets[0];
    assert_eq!(cp.role, Some(SubnetRole::ControlPlane));
    assert_eq!(cp.name, "foo-controlplane-subnet");
    assert_eq!(cp.cidr_blocks, vec!["10.0.0.0/16"]);
    assert_eq!(cp.security_group.name, "foo-controlplane-nsg");
    assert!(cp.route_table.name.is_empty());

    let node = &net.subnets[1];
    assert_eq!(node.role, Some(SubnetRole::Node));
    assert_eq!(node.name, "foo-node-subnet");
    assert_eq!(node.cidr_blocks, vec!["10.1.0.0/16"]);
    assert_eq!(node.security_group.name, "foo-node-nsg");
    assert_eq!(node.route_table.name, "foo-node-routetable");

    let lb = &net.api_server_lb;
    assert_eq!(lb.name, "foo-public-lb");
    assert_eq!(lb.sku, SKU_STANDARD);
    assert_eq!(lb.type_, LB_TYPE_PUBLIC);
    assert_eq!(lb.idle_timeout_in_minutes, Some(4));
    assert_eq!(lb.frontend_ips.len(), 1);
    assert_eq!(lb.frontend_ips[0].name, "foo-public-lb-frontEnd");
    assert_eq!(
        lb.frontend_ips[0].public_ip.as_ref().map(|ip| ip.name.as_str()),
        Some("pip-foo-apiserver")
    );

    let outbound = net.node_outbound_lb.as_ref().expect("node outbound LB should be defaulted");
    assert_eq!(outbound.name, "foo");
    assert_eq!(outbound.frontend_ips_count, Some(1));
    assert_eq!(outbound.idle_timeout_in_minutes, Some(4));
    assert_eq!(outbound.frontend_ips.len(), 1);
    assert_eq!(outbound.frontend_ips[0].name, "foo-frontEnd");
    assert_eq!(
        outbound.frontend_ips[0].public_ip.as_ref().map(|ip| ip.name.as_str()),
        Some("pip-foo-node-outbound")
    );

    assert!(net.control_plane_outbound_lb.is_none());
    assert!(spec.bastion_spec.azure_bastion.is_none());
}

#[test]
fn test_internal_cluster_defaults() {
    let mut cluster = create_test_cluster("foo");
    cluster.spec.network_spec.api_server_lb.type_ = "Internal".to_string();
    cluster.set_defaults().unwrap();
    let net = &cluster.spec.network_spec;

    assert_eq!(net.api_server_lb.name, "foo-internal-lb");
    assert_eq!(net.api_server_lb.frontend_ips.len(), 1);
    assert_eq!(net.api_server_lb.frontend_ips[0].name, "foo-internal-lb-frontEnd");
    assert_eq!(net.api_server_lb.frontend_ips[0].private_ip_address, "10.0.0.100");
    assert!(net.api_server_lb.frontend_ips[0].public_ip.is_none());
    assert!(net.node_outbound_lb.is_none(), "Private clusters get no node outbound LB");
}

#[test]
fn test_defaulting_is_idempotent() {
    let mut once = create_test_cluster("foo");
    once.spec.bastion_spec.azure_bastion = Some(AzureBastion::default());
    once.spec.network_spec.vnet.peerings = vec![VnetPeeringSpec {
        remote_vnet_name: "hub-vnet".to_string(),
        ..Default::default()
    }];
    once.set_defaults().unwrap();

    let mut twice = once.clone();
    twice.set_defaults().unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_internal_cluster_defaults_are_idempotent() {
    let mut once = create_test_cluster("foo");
    once.spec.network_spec.api_server_lb.type_ = "Internal".to_string();
    once.spec.network_spec.control_plane_outbound_lb = Some(LoadBalancerSpec {
        frontend_ips_count: Some(2),
        ..Default::default()
    });
    once.set_defaults().unwrap();

    let mut twice = once.clone();
    twice.set_defaults().unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_nat_gateway_node_subnet_skips_outbound_lb() {
    let mut cluster = create_test_cluster("foo");
    cluster.spec.network_spec.subnets = vec![
        SubnetSpec {
            role: Some(SubnetRole::ControlPlane),
            name: "cp".to_string(),
            ..Default::default()
        },
        SubnetSpec {
            role: Some(SubnetRole::Node),
            name: "workers".to_string(),
            nat_gateway: NatGateway {
                name: "workers-natgw".to_string(),
                ..Default::default()
            },
            ..Default::default()
        },
    ];
    cluster.set_defaults().unwrap();
    let net = &cluster.spec.network_spec;

    assert_eq!(net.subnets.len(), 2, "Existing role subnets should not be duplicated");
    assert_eq!(net.subnets[1].nat_gateway.nat_gateway_ip.name, "pip-foo-workers-natgw");
    assert!(net.node_outbound_lb.is_none());
}

#[test]
fn test_outbound_lb_frontend_count() {
    let mut cluster = create_test_cluster("foo");
    cluster.spec.network_spec.node_outbound_lb = Some(LoadBalancerSpec {
        frontend_ips_count: Some(3),
        ..Default::default()
    });
    cluster.set_defaults().unwrap();

    let lb = cluster.spec.network_spec.node_outbound_lb.expect("node outbound LB");
    let names: Vec<_> = lb.frontend_ips.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["foo-frontEnd-1", "foo-frontEnd-2", "foo-frontEnd-3"]);
    let ips: Vec<_> = lb
        .frontend_ips
        .iter()
        .filter_map(|f| f.public_ip.as_ref().map(|ip| ip.name.as_str()))
        .collect();
    assert_eq!(
        ips,
        vec!["pip-foo-node-outbound-1", "pip-foo-node-outbound-2", "pip-foo-node-outbound-3"]
    );
}

#[test]
fn test_outbound_lb_zero_count_clears_frontends() {
    let mut cluster = create_test_cluster("foo");
    cluster.spec.network_spec.node_outbound_lb = Some(LoadBalancerSpec {
        frontend_ips_count: Some(0),
        ..Default::default()
    });
    cluster.set_defaults().unwrap();
    let lb = cluster.spec.network_spec.node_outbound_lb.expect("node outbound LB");
    assert!(lb.frontend_ips.is_empty());
}

#[test]
fn test_outbound_lb_keeps_matching_frontend_ip_tags() {
    let mut cluster = create_test_cluster("foo");
    cluster.spec.network_spec.node_outbound_lb = Some(LoadBalancerSpec {
        frontend_ips: vec![FrontendIP {
            name: "foo-frontEnd".to_string(),
            public_ip: Some(PublicIPSpec {
                name: "pip-foo-node-outbound".to_string(),
                ip_tags: vec![IPTag {
                    type_: "RoutingPreference".to_string(),
                    tag: "Internet".to_string(),
                }],
                ..Default::default()
            }),
            ..Default::default()
        }],
        ..Default::default()
    });
    cluster.set_defaults().unwrap();
    let lb = cluster.spec.network_spec.node_outbound_lb.expect("node outbound LB");
    assert_eq!(lb.frontend_ips.len(), 1);
    assert_eq!(
        lb.frontend_ips[0].public_ip.as_ref().map(|ip| ip.ip_tags.len()),
        Some(1),
        "User IP tags on a generated frontend should survive defaulting"
    );
}

#[test]
fn test_control_plane_outbound_lb_defaults_for_private_cluster() {
    let mut cluster = create_test_cluster("foo");
    cluster.spec.network_spec.api_server_lb.type_ = "Internal".to_string();
    cluster.spec.network_spec.control_plane_outbound_lb = Some(LoadBalancerSpec::default());
    cluster.set_defaults().unwrap();

    let lb = cluster
        .spec
        .network_spec
        .control_plane_outbound_lb
        .expect("control plane outbound LB");
    assert_eq!(lb.name, "foo-outbound-lb");
    assert_eq!(lb.sku, SKU_STANDARD);
    assert_eq!(lb.frontend_ips_count, Some(1));
    assert_eq!(lb.frontend_ips[0].name, "foo-outbound-lb-frontEnd");
    assert_eq!(
        lb.frontend_ips[0].public_ip.as_ref().map(|ip| ip.name.as_str()),
        Some("pip-foo-controlplane-outbound")
    );
}

#[test]
fn test_bastion_defaults() {
    let mut cluster = create_test_cluster("foo");
    cluster.spec.bastion_spec.azure_bastion = Some(AzureBastion::default());
    cluster.set_defaults().unwrap();

    let bastion = cluster.spec.bastion_spec.azure_bastion.expect("bastion");
    assert_eq!(bastion.name, "foo-azure-bastion");
    assert_eq!(bastion.subnet.name, "AzureBastionSubnet");
    assert_eq!(bastion.subnet.cidr_blocks, vec!["10.255.255.224/27"]);
    assert_eq!(bastion.subnet.role, Some(SubnetRole::Bastion));
    assert_eq!(bastion.public_ip.name, "foo-azure-bastion-pip");
}

#[test]
fn test_cluster_subnet_replaces_role_subnets() {
    let mut cluster = create_test_cluster("foo");
    cluster.spec.network_spec.subnets = vec![SubnetSpec {
        role: Some(SubnetRole::Cluster),
        ..Default::default()
    }];
    cluster.set_defaults().unwrap();
    let net = &cluster.spec.network_spec;

    assert_eq!(net.subnets.len(), 1);
    assert_eq!(net.subnets[0].name, "foo-subnet");
    assert_eq!(net.subnets[0].security_group.name, "foo-nsg");
    assert_eq!(net.subnets[0].route_table.name, "foo-routetable");
    assert_eq!(net.subnets[0].cidr_blocks, vec!["10.0.0.0/16"]);
    assert!(net.node_outbound_lb.is_some(), "Cluster subnet without NAT needs outbound LB");
}

#[test]
fn test_multiple_node_subnets_get_indexed_names() {
    let mut cluster = create_test_cluster("foo");
    cluster.spec.network_spec.subnets = vec![
        SubnetSpec {
            role: Some(SubnetRole::Node),
            ..Default::default()
        },
        SubnetSpec {
            role: Some(SubnetRole::Node),
            ..Default::default()
        },
    ];
    cluster.set_defaults().unwrap();
    let net = &cluster.spec.network_spec;

    assert_eq!(net.subnets.len(), 3, "Control plane subnet should be appended");
    assert_eq!(net.subnets[0].name, "foo-node-subnet");
    assert_eq!(net.subnets[0].cidr_blocks, vec!["10.1.0.0/16"]);
    assert_eq!(net.subnets[1].name, "foo-node-subnet-2");
    assert_eq!(net.subnets[1].cidr_blocks, vec!["10.2.0.0/16"]);
    assert_eq!(net.subnets[2].role, Some(SubnetRole::ControlPlane));
}

#[test]
fn test_security_rule_direction_defaults_to_inbound() {
    let mut cluster = create_test_cluster("foo");
    cluster.spec.network_spec.subnets = vec![SubnetSpec {
        role: Some(SubnetRole::ControlPlane),
        security_group: SecurityGroup {
            security_rules: vec![SecurityRule {
                name: "allow_ssh".to_string(),
                protocol: "Tcp".to_string(),
                priority: 2200,
                ..Default::default()
            }],
            ..Default::default()
        },
        ..Default::default()
    }];
    cluster.set_defaults().unwrap();
    let rule = &cluster.spec.network_spec.subnets[0].security_group.security_rules[0];
    assert_eq!(rule.direction, SECURITY_RULE_DIRECTION_INBOUND);
}

#[test]
fn test_security_rule_direction_defaults_for_every_subnet() {
    let ssh_rule = || SecurityGroup {
        security_rules: vec![SecurityRule {
            name: "allow_ssh".to_string(),
            protocol: "Tcp".to_string(),
            priority: 2200,
            ..Default::default()
        }],
        ..Default::default()
    };
    let mut cluster = create_test_cluster("foo");
    cluster.spec.network_spec.subnets = vec![
        SubnetSpec {
            role: Some(SubnetRole::Bastion),
            name: "extra-bastion".to_string(),
            security_group: ssh_rule(),
            ..Default::default()
        },
        SubnetSpec {
            name: "no-role".to_string(),
            security_group: ssh_rule(),
            ..Default::default()
        },
    ];
    cluster.spec.bastion_spec.azure_bastion = Some(AzureBastion {
        subnet: SubnetSpec {
            security_group: ssh_rule(),
            ..Default::default()
        },
        ..Default::default()
    });
    cluster.set_defaults().unwrap();

    for subnet in &cluster.spec.network_spec.subnets[..2] {
        assert_eq!(subnet.security_group.security_rules[0].direction, SECURITY_RULE_DIRECTION_INBOUND);
    }
    let bastion = cluster.spec.bastion_spec.azure_bastion.expect("bastion");
    assert_eq!(bastion.subnet.security_group.security_rules[0].direction, SECURITY_RULE_DIRECTION_INBOUND);
}

#[test]
fn test_existing_values_are_kept() {
    let mut cluster = create_test_cluster("foo");
    cluster.spec.resource_group = "my-rg".to_string();
    cluster.spec.azure_environment = "AzureChinaCloud".to_string();
    cluster.spec.network_spec.vnet.name = "my-vnet".to_string();
    cluster.spec.network_spec.api_server_lb.name = "my-lb".to_string();
    cluster.set_defaults().unwrap();

    assert_eq!(cluster.spec.resource_group, "my-rg");
    assert_eq!(cluster.spec.azure_environment, "AzureChinaCloud");
    assert_eq!(cluster.spec.network_spec.vnet.name, "my-vnet");
    assert_eq!(cluster.spec.network_spec.vnet.resource_group, "my-rg");
    assert_eq!(cluster.spec.network_spec.api_server_lb.name, "my-lb");
    assert_eq!(cluster.spec.network_spec.api_server_lb.frontend_ips[0].name, "my-lb-frontEnd");
}
