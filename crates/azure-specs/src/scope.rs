//! Spec builders for a cluster and its machines
//!
//! A scope reads the hub objects and produces every spec a reconciler
//! needs, in creation order. Names and references come straight from the
//! defaulted objects; nothing here invents a name the defaulter did not.

use std::collections::BTreeSet;

use azure_crds::v1beta1::{self, AzureCluster, AzureMachine, LoadBalancerSpec, SubnetRole, Tags};
use tracing::debug;

use crate::models::InboundNatRule;
use crate::names::{
    availability_set_name, backend_pool_name, network_interface_name, node_public_ip_name,
    outbound_backend_pool_name,
};
use crate::specs::load_balancer::DEFAULT_API_SERVER_PORT;
use crate::specs::{
    AvailabilitySetSpec, BastionSpec, InboundNatSpec, LBSpec, LoadBalancerRole, NICSpec, NatGatewaySpec,
    PublicIPSpec, RouteTableSpec, SecurityGroupSpec, SubnetSpec, VMExtensionSpec, VMSpec, VNetSpec,
};

/// Node group name used for the control plane availability set.
pub const CONTROL_PLANE_NODE_GROUP: &str = "control-plane";

/// Specs of the cluster-wide network resources
#[derive(Debug, Clone, Copy)]
pub struct ClusterScope<'a> {
    cluster_name: &'a str,
    cluster: &'a AzureCluster,
}

impl<'a> ClusterScope<'a> {
    /// Scope over a defaulted `cluster` owned by the CAPI cluster `cluster_name`.
    pub fn new(cluster_name: &'a str, cluster: &'a AzureCluster) -> Self {
        ClusterScope { cluster_name, cluster }
    }

    /// CAPI cluster name.
    pub fn cluster_name(&self) -> &'a str {
        self.cluster_name
    }

    fn subscription_id(&self) -> String {
        self.cluster.spec.subscription_id.clone()
    }

    fn resource_group(&self) -> String {
        self.cluster.spec.resource_group.clone()
    }

    fn location(&self) -> String {
        self.cluster.spec.location.clone()
    }

    fn tags(&self) -> &'a Tags {
        &self.cluster.spec.additional_tags
    }

    fn network(&self) -> &'a v1beta1::NetworkSpec {
        &self.cluster.spec.network_spec
    }

    fn vnet_resource_group(&self) -> String {
        let vnet = &self.network().vnet;
        if vnet.resource_group.is_empty() {
            self.resource_group()
        } else {
            vnet.resource_group.clone()
        }
    }

    /// True when the cluster created the vnet.
    pub fn is_vnet_managed(&self) -> bool {
        self.network().vnet.is_managed(self.cluster_name)
    }

    /// Failure domains reported on the cluster status.
    pub fn failure_domains(&self) -> Vec<String> {
        self.cluster
            .status
            .as_ref()
            .map(|status| status.failure_domains.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn all_subnets(&self) -> impl Iterator<Item = &'a v1beta1::SubnetSpec> {
        let bastion = self.cluster.spec.bastion_spec.azure_bastion.as_ref().map(|b| &b.subnet);
        self.network().subnets.iter().chain(bastion)
    }

    /// Subnet hosting machines of `role`.
    pub fn subnet_for(&self, role: SubnetRole) -> Option<&'a v1beta1::SubnetSpec> {
        let network = self.network();
        network
            .subnets_with_role(role)
            .next()
            .or_else(|| network.subnets_with_role(SubnetRole::Cluster).next())
    }

    /// The cluster vnet.
    pub fn vnet_spec(&self) -> VNetSpec {
        let vnet = &self.network().vnet;
        VNetSpec {
            resource_group: self.vnet_resource_group(),
            name: vnet.name.clone(),
            cidrs: vnet.cidr_blocks.clone(),
            location: self.location(),
            cluster_name: self.cluster_name.to_string(),
            additional_tags: self.tags().merge(&vnet.tags),
        }
    }

    /// Every subnet, the bastion subnet last.
    pub fn subnet_specs(&self) -> Vec<SubnetSpec> {
        let is_vnet_managed = self.is_vnet_managed();
        self.all_subnets()
            .map(|subnet| SubnetSpec {
                name: subnet.name.clone(),
                resource_group: self.resource_group(),
                subscription_id: self.subscription_id(),
                cidrs: subnet.cidr_blocks.clone(),
                vnet_name: self.network().vnet.name.clone(),
                vnet_resource_group: self.vnet_resource_group(),
                is_vnet_managed,
                route_table_name: subnet.route_table.name.clone(),
                security_group_name: subnet.security_group.name.clone(),
                role: subnet.role,
                nat_gateway_name: subnet.nat_gateway.name.clone(),
            })
            .collect()
    }

    /// One spec per distinct security group.
    pub fn security_group_specs(&self) -> Vec<SecurityGroupSpec> {
        let mut seen = BTreeSet::new();
        self.network()
            .subnets
            .iter()
            .map(|subnet| &subnet.security_group)
            .filter(|nsg| !nsg.name.is_empty() && seen.insert(nsg.name.as_str()))
            .map(|nsg| SecurityGroupSpec {
                name: nsg.name.clone(),
                resource_group: self.resource_group(),
                location: self.location(),
                security_rules: nsg.security_rules.clone(),
                cluster_name: self.cluster_name.to_string(),
                additional_tags: self.tags().merge(&nsg.tags),
            })
            .collect()
    }

    /// One spec per distinct route table.
    pub fn route_table_specs(&self) -> Vec<RouteTableSpec> {
        let mut seen = BTreeSet::new();
        self.network()
            .subnets
            .iter()
            .map(|subnet| subnet.route_table.name.as_str())
            .filter(|name| !name.is_empty() && seen.insert(*name))
            .map(|name| RouteTableSpec {
                name: name.to_string(),
                resource_group: self.resource_group(),
                location: self.location(),
                cluster_name: self.cluster_name.to_string(),
                additional_tags: self.tags().clone(),
            })
            .collect()
    }

    fn nat_gateways(&self) -> Vec<&'a v1beta1::NatGateway> {
        let mut seen = BTreeSet::new();
        self.network()
            .subnets
            .iter()
            .filter(|subnet| subnet.is_nat_gateway_enabled())
            .map(|subnet| &subnet.nat_gateway)
            .filter(|natgw| seen.insert(natgw.name.as_str()))
            .collect()
    }

    /// One spec per distinct NAT gateway.
    pub fn nat_gateway_specs(&self) -> Vec<NatGatewaySpec> {
        self.nat_gateways()
            .into_iter()
            .map(|natgw| NatGatewaySpec {
                name: natgw.name.clone(),
                resource_group: self.resource_group(),
                subscription_id: self.subscription_id(),
                location: self.location(),
                public_ip_name: natgw.nat_gateway_ip.name.clone(),
                cluster_name: self.cluster_name.to_string(),
                additional_tags: self.tags().clone(),
            })
            .collect()
    }

    fn public_ip_spec(&self, ip: &v1beta1::PublicIPSpec) -> PublicIPSpec {
        PublicIPSpec {
            name: ip.name.clone(),
            resource_group: self.resource_group(),
            location: self.location(),
            dns_name: ip.dns_name.clone(),
            is_ipv6: false,
            ip_tags: ip.ip_tags.clone(),
            zones: self.failure_domains(),
            cluster_name: self.cluster_name.to_string(),
            additional_tags: self.tags().clone(),
        }
    }

    /// Public IPs of load balancer frontends, NAT gateways and the bastion.
    pub fn public_ip_specs(&self) -> Vec<PublicIPSpec> {
        let network = self.network();
        let load_balancers = std::iter::once(&network.api_server_lb)
            .chain(network.node_outbound_lb.as_ref())
            .chain(network.control_plane_outbound_lb.as_ref())
            .filter(|lb| !lb.is_internal());

        let mut specs: Vec<PublicIPSpec> = load_balancers
            .flat_map(|lb| lb.frontend_ips.iter())
            .filter_map(|frontend| frontend.public_ip.as_ref())
            .map(|ip| self.public_ip_spec(ip))
            .collect();
        specs.extend(self.nat_gateways().into_iter().map(|natgw| self.public_ip_spec(&natgw.nat_gateway_ip)));
        if let Some(bastion) = &self.cluster.spec.bastion_spec.azure_bastion {
            specs.push(self.public_ip_spec(&bastion.public_ip));
        }
        specs
    }

    fn lb_spec(&self, lb: &LoadBalancerSpec, role: LoadBalancerRole) -> LBSpec {
        let backend_pool_name = match role {
            LoadBalancerRole::ApiServer => backend_pool_name(&lb.name),
            LoadBalancerRole::NodeOutbound | LoadBalancerRole::ControlPlaneOutbound => {
                outbound_backend_pool_name(&lb.name)
            }
        };
        let port = self.cluster.spec.control_plane_endpoint.port;
        LBSpec {
            name: lb.name.clone(),
            resource_group: self.resource_group(),
            subscription_id: self.subscription_id(),
            location: self.location(),
            role,
            type_: lb.type_.clone(),
            sku: lb.sku.clone(),
            frontend_ips: lb.frontend_ips.clone(),
            subnet_name: self
                .subnet_for(SubnetRole::ControlPlane)
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            vnet_name: self.network().vnet.name.clone(),
            vnet_resource_group: self.vnet_resource_group(),
            backend_pool_name,
            idle_timeout_in_minutes: lb.idle_timeout_in_minutes,
            api_server_port: if port > 0 { port } else { DEFAULT_API_SERVER_PORT },
            cluster_name: self.cluster_name.to_string(),
            additional_tags: self.tags().clone(),
        }
    }

    /// API server load balancer followed by the outbound load balancers.
    pub fn load_balancer_specs(&self) -> Vec<LBSpec> {
        let network = self.network();
        let mut specs = vec![self.lb_spec(&network.api_server_lb, LoadBalancerRole::ApiServer)];
        if let Some(lb) = &network.node_outbound_lb {
            specs.push(self.lb_spec(lb, LoadBalancerRole::NodeOutbound));
        }
        if let Some(lb) = &network.control_plane_outbound_lb {
            specs.push(self.lb_spec(lb, LoadBalancerRole::ControlPlaneOutbound));
        }
        specs
    }

    /// The bastion host, when enabled.
    pub fn bastion_specs(&self) -> Vec<BastionSpec> {
        self.cluster
            .spec
            .bastion_spec
            .azure_bastion
            .iter()
            .map(|bastion| BastionSpec {
                name: bastion.name.clone(),
                resource_group: self.resource_group(),
                subscription_id: self.subscription_id(),
                location: self.location(),
                subnet_name: bastion.subnet.name.clone(),
                vnet_name: self.network().vnet.name.clone(),
                vnet_resource_group: self.vnet_resource_group(),
                public_ip_name: bastion.public_ip.name.clone(),
                cluster_name: self.cluster_name.to_string(),
                additional_tags: self.tags().clone(),
            })
            .collect()
    }
}

/// Role of a machine in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineRole {
    /// Runs the control plane
    ControlPlane,
    /// Runs workloads
    Node,
}

impl MachineRole {
    /// Role tag value.
    pub fn as_str(self) -> &'static str {
        match self {
            MachineRole::ControlPlane => "control-plane",
            MachineRole::Node => "node",
        }
    }

    fn subnet_role(self) -> SubnetRole {
        match self {
            MachineRole::ControlPlane => SubnetRole::ControlPlane,
            MachineRole::Node => SubnetRole::Node,
        }
    }
}

/// Specs of the resources owned by one machine
#[derive(Debug, Clone, Copy)]
pub struct MachineScope<'a> {
    cluster: ClusterScope<'a>,
    machine: &'a AzureMachine,
    role: MachineRole,
    node_group: &'a str,
}

impl<'a> MachineScope<'a> {
    /// Scope over a defaulted `machine` of `node_group`.
    pub fn new(cluster: ClusterScope<'a>, machine: &'a AzureMachine, role: MachineRole, node_group: &'a str) -> Self {
        MachineScope {
            cluster,
            machine,
            role,
            node_group,
        }
    }

    /// Machine (and VM) name.
    pub fn name(&self) -> &'a str {
        self.machine.metadata.name.as_deref().unwrap_or_default()
    }

    fn spec(&self) -> &'a v1beta1::AzureMachineSpec {
        &self.machine.spec
    }

    fn api_server_lb(&self) -> &'a LoadBalancerSpec {
        &self.cluster.network().api_server_lb
    }

    /// Subnet the machine NIC attaches to.
    pub fn subnet_name(&self) -> String {
        if !self.spec().subnet_name.is_empty() {
            return self.spec().subnet_name.clone();
        }
        self.cluster
            .subnet_for(self.role.subnet_role())
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }

    fn uses_node_outbound_lb(&self) -> bool {
        let subnet_name = self.subnet_name();
        let nat_enabled = self
            .cluster
            .network()
            .subnets
            .iter()
            .any(|s| s.name == subnet_name && s.is_nat_gateway_enabled());
        !nat_enabled && self.cluster.network().node_outbound_lb.is_some()
    }

    /// The machine NIC and its load balancer memberships.
    pub fn nic_spec(&self) -> NICSpec {
        let network = self.cluster.network();
        let mut spec = NICSpec {
            name: network_interface_name(self.name()),
            resource_group: self.cluster.resource_group(),
            subscription_id: self.cluster.subscription_id(),
            location: self.cluster.location(),
            machine_name: self.name().to_string(),
            subnet_name: self.subnet_name(),
            vnet_name: network.vnet.name.clone(),
            vnet_resource_group: self.cluster.vnet_resource_group(),
            public_ip_name: self.spec().allocate_public_ip.then(|| node_public_ip_name(self.name())),
            accelerated_networking: self.spec().accelerated_networking,
            ip_forwarding: self.spec().enable_ip_forwarding,
            cluster_name: self.cluster.cluster_name.to_string(),
            additional_tags: self.cluster.tags().merge(&self.spec().additional_tags),
            ..Default::default()
        };

        match self.role {
            MachineRole::ControlPlane => {
                let lb = self.api_server_lb();
                if lb.is_internal() {
                    spec.internal_lb_name = Some(lb.name.clone());
                    spec.internal_lb_backend_pool_name = Some(backend_pool_name(&lb.name));
                    if let Some(outbound) = &network.control_plane_outbound_lb {
                        spec.public_lb_name = Some(outbound.name.clone());
                        spec.public_lb_backend_pool_name = Some(outbound_backend_pool_name(&outbound.name));
                    }
                } else {
                    spec.public_lb_name = Some(lb.name.clone());
                    spec.public_lb_backend_pool_name = Some(backend_pool_name(&lb.name));
                    spec.public_lb_nat_rule_name = Some(self.name().to_string());
                }
            }
            MachineRole::Node => {
                let outbound = network.node_outbound_lb.as_ref().filter(|_| self.uses_node_outbound_lb());
                if let Some(outbound) = outbound {
                    spec.public_lb_name = Some(outbound.name.clone());
                    spec.public_lb_backend_pool_name = Some(outbound_backend_pool_name(&outbound.name));
                }
            }
        }
        spec
    }

    /// SSH NAT rule for control plane machines behind a public API server load balancer.
    pub fn inbound_nat_spec(&self, rules_on_load_balancer: Vec<InboundNatRule>) -> Option<InboundNatSpec> {
        let lb = self.api_server_lb();
        if self.role != MachineRole::ControlPlane || lb.is_internal() {
            return None;
        }
        let frontend = lb.frontend_ips.first()?;
        Some(InboundNatSpec {
            name: self.name().to_string(),
            load_balancer_name: lb.name.clone(),
            resource_group: self.cluster.resource_group(),
            subscription_id: self.cluster.subscription_id(),
            frontend_ip_name: frontend.name.clone(),
            rules_on_load_balancer,
        })
    }

    /// Public IP of the machine, when requested.
    pub fn public_ip_spec(&self) -> Option<PublicIPSpec> {
        self.spec().allocate_public_ip.then(|| PublicIPSpec {
            name: node_public_ip_name(self.name()),
            resource_group: self.cluster.resource_group(),
            location: self.cluster.location(),
            zones: self.spec().failure_domain.iter().cloned().collect(),
            cluster_name: self.cluster.cluster_name.to_string(),
            additional_tags: self.cluster.tags().merge(&self.spec().additional_tags),
            ..Default::default()
        })
    }

    fn node_group(&self) -> &'a str {
        match self.role {
            MachineRole::ControlPlane => CONTROL_PLANE_NODE_GROUP,
            MachineRole::Node => self.node_group,
        }
    }

    fn availability_set_name(&self) -> Option<String> {
        if self.spec().failure_domain.is_some() || !self.cluster.failure_domains().is_empty() {
            return None;
        }
        Some(availability_set_name(self.cluster.cluster_name, self.node_group()))
    }

    /// Availability set shared by the node group, used only in regions without zones.
    pub fn availability_set_spec(&self, fault_domain_count: i32) -> Option<AvailabilitySetSpec> {
        let name = self.availability_set_name()?;
        debug!(machine = %self.name(), availability_set = %name, "placing machine in availability set");
        Some(AvailabilitySetSpec {
            name,
            resource_group: self.cluster.resource_group(),
            location: self.cluster.location(),
            fault_domain_count,
            cluster_name: self.cluster.cluster_name.to_string(),
            additional_tags: self.cluster.tags().clone(),
        })
    }

    /// The VM, booted with `bootstrap_data`.
    pub fn vm_spec(&self, bootstrap_data: &str) -> VMSpec {
        let spec = self.spec();
        VMSpec {
            name: self.name().to_string(),
            resource_group: self.cluster.resource_group(),
            subscription_id: self.cluster.subscription_id(),
            location: self.cluster.location(),
            role: self.role.as_str().to_string(),
            nic_names: vec![network_interface_name(self.name())],
            ssh_public_key: spec.ssh_public_key.clone(),
            size: spec.vm_size.clone(),
            os_disk: spec.os_disk.clone(),
            data_disks: spec.data_disks.clone(),
            image: spec.image.clone(),
            availability_set_name: self.availability_set_name(),
            zone: spec.failure_domain.clone(),
            identity: spec.identity,
            user_assigned_identities: spec.user_assigned_identities.clone(),
            spot_vm_options: spec.spot_vm_options.clone(),
            security_profile: spec.security_profile.clone(),
            additional_capabilities: spec.additional_capabilities.clone(),
            bootstrap_data: bootstrap_data.to_string(),
            cluster_name: self.cluster.cluster_name.to_string(),
            additional_tags: self.cluster.tags().merge(&spec.additional_tags),
        }
    }

    /// Bootstrap-sentinel extension of the VM.
    pub fn bootstrap_extension_spec(&self) -> Option<VMExtensionSpec> {
        VMExtensionSpec::bootstrap(
            &self.spec().os_disk.os_type,
            &self.cluster.cluster.spec.azure_environment,
            self.name(),
            &self.cluster.resource_group(),
            &self.cluster.location(),
        )
    }
}
