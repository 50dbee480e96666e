//! AzureCluster defaulting
//!
//! Defaults are split in two passes:
//! - class defaults: CIDRs, SKUs, LB types and topology, safe for templates
//! - named defaults: every name derived from the cluster name
//!
//! Both passes only fill unset fields, so running them twice is a no-op.

use kube::ResourceExt;
use tracing::debug;

use super::azure_cluster::{AZURE_PUBLIC_CLOUD, AzureCluster, AzureClusterSpec};
use super::types::{
    AzureBastion, BastionSpec, DEFAULT_LB_IDLE_TIMEOUT_IN_MINUTES, FrontendIP, LB_TYPE_PUBLIC,
    LoadBalancerSpec, NetworkSpec, PublicIPSpec, SECURITY_RULE_DIRECTION_INBOUND,
    SKU_STANDARD, SecurityGroup, SubnetRole, SubnetSpec,
};
use crate::error::ApiError;
use crate::naming;
use crate::webhook::Defaulter;

impl Defaulter for AzureCluster {
    fn set_defaults(&mut self) -> Result<(), ApiError> {
        let name = self.name_any();
        debug!("Defaulting AzureCluster {}", name);
        self.spec.set_defaults(&name);
        Ok(())
    }
}

impl AzureClusterSpec {
    /// Fills every unset field, deriving names from `cluster`.
    pub fn set_defaults(&mut self, cluster: &str) {
        if self.resource_group.is_empty() {
            self.resource_group = cluster.to_string();
        }
        if self.azure_environment.is_empty() {
            self.azure_environment = AZURE_PUBLIC_CLOUD.to_string();
        }
        self.network_spec.set_class_defaults();
        self.network_spec.set_named_defaults(cluster, &self.resource_group);
        self.bastion_spec.set_class_defaults();
        self.bastion_spec.set_named_defaults(cluster);
    }
}

impl NetworkSpec {
    /// Defaults that do not depend on the cluster name.
    pub fn set_class_defaults(&mut self) {
        if self.vnet.cidr_blocks.is_empty() {
            self.vnet.cidr_blocks = vec![naming::DEFAULT_VNET_CIDR.to_string()];
        }
        self.set_subnet_class_defaults();
        self.api_server_lb.set_api_server_class_defaults();
        self.set_node_outbound_lb_class_defaults();
        self.set_control_plane_outbound_lb_class_defaults();
    }

    /// Defaults for every name derived from `cluster`.
    pub fn set_named_defaults(&mut self, cluster: &str, resource_group: &str) {
        if self.vnet.resource_group.is_empty() {
            self.vnet.resource_group = resource_group.to_string();
        }
        if self.vnet.name.is_empty() {
            self.vnet.name = naming::vnet_name(cluster);
        }
        for peering in &mut self.vnet.peerings {
            if peering.resource_group.is_empty() {
                peering.resource_group = resource_group.to_string();
            }
        }
        self.set_subnet_named_defaults(cluster);
        self.set_api_server_lb_named_defaults(cluster);
        if let Some(lb) = self.node_outbound_lb.as_mut() {
            if lb.name.is_empty() {
                lb.name = naming::node_outbound_lb_name(cluster);
            }
            set_outbound_frontend_ips(lb, cluster, naming::NODE_OUTBOUND_ROLE);
        }
        if self.api_server_lb.is_internal() {
            if let Some(lb) = self.control_plane_outbound_lb.as_mut() {
                if lb.name.is_empty() {
                    lb.name = naming::control_plane_outbound_lb_name(cluster);
                }
                set_outbound_frontend_ips(lb, cluster, naming::CONTROL_PLANE_OUTBOUND_ROLE);
            }
        }
    }

    fn set_subnet_class_defaults(&mut self) {
        let has_cluster_subnet = self.has_cluster_subnet();
        if !has_cluster_subnet {
            if self.subnets_with_role(SubnetRole::ControlPlane).next().is_none() {
                self.subnets.push(SubnetSpec {
                    role: Some(SubnetRole::ControlPlane),
                    ..SubnetSpec::default()
                });
            }
            if self.subnets_with_role(SubnetRole::Node).next().is_none() {
                self.subnets.push(SubnetSpec {
                    role: Some(SubnetRole::Node),
                    ..SubnetSpec::default()
                });
            }
        }

        let mut node_counter = 0;
        for subnet in &mut self.subnets {
            subnet.security_group.set_security_rule_defaults();
            let default_cidr = match subnet.role {
                Some(SubnetRole::ControlPlane) => naming::DEFAULT_CONTROL_PLANE_SUBNET_CIDR.to_string(),
                Some(SubnetRole::Node) => {
                    node_counter += 1;
                    naming::node_subnet_cidr(node_counter)
                }
                Some(SubnetRole::Cluster) => naming::DEFAULT_CLUSTER_SUBNET_CIDR.to_string(),
                Some(SubnetRole::Bastion) | None => continue,
            };
            if subnet.cidr_blocks.is_empty() {
                subnet.cidr_blocks = vec![default_cidr];
            }
        }
    }

    fn set_subnet_named_defaults(&mut self, cluster: &str) {
        let mut node_counter = 0;
        for subnet in &mut self.subnets {
            match subnet.role {
                Some(SubnetRole::ControlPlane) => {
                    if subnet.name.is_empty() {
                        subnet.name = naming::control_plane_subnet_name(cluster);
                    }
                    if subnet.security_group.name.is_empty() {
                        subnet.security_group.name = naming::control_plane_security_group_name(cluster);
                    }
                }
                Some(SubnetRole::Node) => {
                    node_counter += 1;
                    if subnet.name.is_empty() {
                        subnet.name = if node_counter == 1 {
                            naming::node_subnet_name(cluster)
                        } else {
                            naming::with_index(&naming::node_subnet_name(cluster), node_counter)
                        };
                    }
                    if subnet.security_group.name.is_empty() {
                        subnet.security_group.name = naming::node_security_group_name(cluster);
                    }
                    if subnet.route_table.name.is_empty() {
                        subnet.route_table.name = naming::node_route_table_name(cluster);
                    }
                }
                Some(SubnetRole::Cluster) => {
                    if subnet.name.is_empty() {
                        subnet.name = naming::cluster_subnet_name(cluster);
                    }
                    if subnet.security_group.name.is_empty() {
                        subnet.security_group.name = naming::cluster_security_group_name(cluster);
                    }
                    if subnet.route_table.name.is_empty() {
                        subnet.route_table.name = naming::cluster_route_table_name(cluster);
                    }
                }
                Some(SubnetRole::Bastion) | None => continue,
            }
            if subnet.is_nat_gateway_enabled() && subnet.nat_gateway.nat_gateway_ip.name.is_empty() {
                subnet.nat_gateway.nat_gateway_ip.name = naming::nat_gateway_ip_name(cluster, &subnet.name);
            }
        }
    }

    fn set_api_server_lb_named_defaults(&mut self, cluster: &str) {
        let lb = &mut self.api_server_lb;
        if lb.is_public() {
            if lb.name.is_empty() {
                lb.name = naming::public_lb_name(cluster);
            }
            if lb.frontend_ips.is_empty() {
                lb.frontend_ips = vec![FrontendIP {
                    name: naming::frontend_ip_config_name(&lb.name),
                    public_ip: Some(PublicIPSpec {
                        name: naming::api_server_public_ip_name(cluster),
                        ..PublicIPSpec::default()
                    }),
                    ..FrontendIP::default()
                }];
            }
        } else if lb.is_internal() {
            if lb.name.is_empty() {
                lb.name = naming::internal_lb_name(cluster);
            }
            if lb.frontend_ips.is_empty() {
                lb.frontend_ips = vec![FrontendIP {
                    name: naming::frontend_ip_config_name(&lb.name),
                    private_ip_address: naming::DEFAULT_INTERNAL_LB_IP.to_string(),
                    ..FrontendIP::default()
                }];
            }
        }
    }

    /// Public clusters need outbound SNAT for any node subnet without a NAT gateway.
    fn needs_node_outbound_lb(&self) -> bool {
        !self.api_server_lb.is_internal() && self.node_subnets().any(|s| !s.is_nat_gateway_enabled())
    }

    fn set_node_outbound_lb_class_defaults(&mut self) {
        if self.node_outbound_lb.is_none() {
            if !self.needs_node_outbound_lb() {
                return;
            }
            self.node_outbound_lb = Some(LoadBalancerSpec::default());
        }
        if let Some(lb) = self.node_outbound_lb.as_mut() {
            lb.set_outbound_class_defaults();
        }
    }

    fn set_control_plane_outbound_lb_class_defaults(&mut self) {
        if !self.api_server_lb.is_internal() {
            return;
        }
        if let Some(lb) = self.control_plane_outbound_lb.as_mut() {
            lb.set_outbound_class_defaults();
        }
    }
}

impl LoadBalancerSpec {
    fn set_api_server_class_defaults(&mut self) {
        if self.type_.is_empty() {
            self.type_ = LB_TYPE_PUBLIC.to_string();
        }
        self.set_common_class_defaults();
    }

    fn set_outbound_class_defaults(&mut self) {
        if self.type_.is_empty() {
            self.type_ = LB_TYPE_PUBLIC.to_string();
        }
        if self.frontend_ips_count.is_none() {
            self.frontend_ips_count = Some(1);
        }
        self.set_common_class_defaults();
    }

    fn set_common_class_defaults(&mut self) {
        if self.sku.is_empty() {
            self.sku = SKU_STANDARD.to_string();
        }
        if self.idle_timeout_in_minutes.is_none() {
            self.idle_timeout_in_minutes = Some(DEFAULT_LB_IDLE_TIMEOUT_IN_MINUTES);
        }
    }
}

/// Regenerates outbound frontends to match `frontendIPsCount`.
///
/// One frontend gets the plain names; more are suffixed `-1..-n`.
/// Existing entries whose name matches a generated one are kept as-is.
fn set_outbound_frontend_ips(lb: &mut LoadBalancerSpec, cluster: &str, role: &str) {
    let count = usize::try_from(lb.frontend_ips_count.unwrap_or(1)).unwrap_or(0);
    let config_name = naming::frontend_ip_config_name(&lb.name);
    let ip_name = naming::outbound_public_ip_name(cluster, role);

    let generated: Vec<(String, String)> = match count {
        0 => Vec::new(),
        1 => vec![(config_name, ip_name)],
        n => (1..=n)
            .map(|i| (naming::with_index(&config_name, i), naming::with_index(&ip_name, i)))
            .collect(),
    };

    let frontends = generated
        .into_iter()
        .map(|(name, ip)| {
            lb.frontend_ips
                .iter()
                .find(|existing| existing.name == name)
                .cloned()
                .unwrap_or_else(|| FrontendIP {
                    name,
                    public_ip: Some(PublicIPSpec {
                        name: ip,
                        ..PublicIPSpec::default()
                    }),
                    ..FrontendIP::default()
                })
        })
        .collect();
    lb.frontend_ips = frontends;
}

impl SecurityGroup {
    fn set_security_rule_defaults(&mut self) {
        for rule in &mut self.security_rules {
            if rule.direction.is_empty() {
                rule.direction = SECURITY_RULE_DIRECTION_INBOUND.to_string();
            }
        }
    }
}

impl BastionSpec {
    /// Bastion subnet defaults; the subnet name is fixed by Azure.
    pub fn set_class_defaults(&mut self) {
        let Some(bastion) = self.azure_bastion.as_mut() else {
            return;
        };
        let subnet = &mut bastion.subnet;
        if subnet.name.is_empty() {
            subnet.name = naming::AZURE_BASTION_SUBNET_NAME.to_string();
        }
        if subnet.cidr_blocks.is_empty() {
            subnet.cidr_blocks = vec![naming::DEFAULT_AZURE_BASTION_SUBNET_CIDR.to_string()];
        }
        if subnet.role.is_none() {
            subnet.role = Some(SubnetRole::Bastion);
        }
        subnet.security_group.set_security_rule_defaults();
    }

    /// Bastion host and public IP names.
    pub fn set_named_defaults(&mut self, cluster: &str) {
        let Some(AzureBastion { name, public_ip, .. }) = self.azure_bastion.as_mut() else {
            return;
        };
        if name.is_empty() {
            *name = naming::azure_bastion_name(cluster);
        }
        if public_ip.name.is_empty() {
            public_ip.name = naming::azure_bastion_public_ip_name(cluster);
        }
    }
}
