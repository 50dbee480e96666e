//! AzureCluster validation
//!
//! Create-time structural rules plus update-time immutability rules.
//! Every rule runs; the collected errors are returned together.

use std::collections::{BTreeSet, HashSet};
use std::net::IpAddr;

use ipnet::IpNet;
use kube::ResourceExt;
use tracing::debug;

use super::azure_cluster::{AZURE_PUBLIC_CLOUD, AzureCluster, AzureClusterSpec, SUPPORTED_CLOUD_ENVIRONMENTS};
use super::azure_cluster_identity::AzureClusterIdentity;
use super::types::{
    AzureBastion, CloudProviderConfigOverrides, LB_TYPE_INTERNAL, LB_TYPE_PUBLIC,
    LoadBalancerSpec, MAX_LOAD_BALANCER_OUTBOUND_IPS, NetworkSpec, SECURITY_RULE_DIRECTION_INBOUND,
    SECURITY_RULE_DIRECTION_OUTBOUND, SECURITY_RULE_PROTOCOLS, SKU_STANDARD,
    SUPPORTED_RATE_LIMIT_NAMES, SecurityRule, SubnetRole, SubnetSpec, VnetSpec,
};
use super::validation::{
    CLUSTER_NAME_MAX_LENGTH, CLUSTER_NAME_REGEX, LOAD_BALANCER_NAME_REGEX, PRIVATE_DNS_ZONE_NAME_REGEX,
    RESOURCE_GROUP_REGEX, SECURITY_RULE_DESCRIPTION_MAX_LENGTH, SUBNET_NAME_REGEX, format_list,
    is_valid_cluster_name, is_valid_load_balancer_name, is_valid_private_dns_zone_name,
    is_valid_resource_group, is_valid_subnet_name,
};
use crate::GROUP;
use crate::error::ApiError;
use crate::field::{ErrorList, FieldError, FieldPath};
use crate::naming;
use crate::webhook::Validator;

const IMMUTABLE: &str = "field is immutable";
const MIN_RULE_PRIORITY: i32 = 100;
const MAX_RULE_PRIORITY: i32 = 4096;

impl Validator for AzureCluster {
    fn validate_create(&self) -> Result<(), ApiError> {
        let name = self.name_any();
        let mut errs = validate_cluster_name(&name);
        errs.extend(validate_cluster_spec(&self.spec, None));
        debug!("AzureCluster {} create validation found {} errors", name, errs.len());
        ApiError::check("AzureCluster", GROUP, &name, errs)
    }

    fn validate_update(&self, old: &Self) -> Result<(), ApiError> {
        let name = self.name_any();
        let mut errs = validate_cluster_name(&name);
        errs.extend(validate_cluster_spec(&self.spec, Some(&old.spec)));
        errs.extend(validate_cluster_immutable(&self.spec, &old.spec));
        debug!("AzureCluster {} update validation found {} errors", name, errs.len());
        ApiError::check("AzureCluster", GROUP, &name, errs)
    }
}

/// Cluster name syntax and length.
pub fn validate_cluster_name(name: &str) -> ErrorList {
    let mut errs = ErrorList::new();
    let path = FieldPath::new("metadata").child("name");
    if name.len() > CLUSTER_NAME_MAX_LENGTH {
        errs.push(FieldError::too_long(&path, name, CLUSTER_NAME_MAX_LENGTH));
    }
    if !is_valid_cluster_name(name) {
        errs.push(FieldError::invalid(
            &path,
            name,
            format!("Cluster Name doesn't match regex {CLUSTER_NAME_REGEX}, can contain only lowercase alphanumeric characters and '-', must start/end with an alphanumeric character"),
        ));
    }
    errs
}

/// Structural rules on the cluster spec; `old` enables the update-only LB rules.
pub fn validate_cluster_spec(spec: &AzureClusterSpec, old: Option<&AzureClusterSpec>) -> ErrorList {
    let mut errs = ErrorList::new();
    let spec_path = FieldPath::new("spec");

    if !spec.resource_group.is_empty() && !is_valid_resource_group(&spec.resource_group) {
        errs.push(FieldError::invalid(
            &spec_path.child("resourceGroup"),
            &spec.resource_group,
            format!("resourceGroup doesn't match regex {RESOURCE_GROUP_REGEX}"),
        ));
    }

    if !spec.azure_environment.is_empty()
        && !SUPPORTED_CLOUD_ENVIRONMENTS.contains(&spec.azure_environment.as_str())
    {
        errs.push(FieldError::not_supported(
            &spec_path.child("azureEnvironment"),
            &spec.azure_environment,
            &SUPPORTED_CLOUD_ENVIRONMENTS,
        ));
    }

    if let Some(identity_ref) = &spec.identity_ref {
        let kind = <AzureClusterIdentity as kube::Resource>::kind(&());
        if identity_ref.kind != kind {
            errs.push(FieldError::not_supported(
                &spec_path.child("identityRef").child("kind"),
                &identity_ref.kind,
                &[kind.as_ref()],
            ));
        }
    }

    if let Some(overrides) = &spec.cloud_provider_config_overrides {
        errs.extend(validate_cloud_provider_config_overrides(
            overrides,
            &spec_path.child("cloudProviderConfigOverrides"),
        ));
    }

    errs.extend(validate_network_spec(
        &spec.network_spec,
        old.map(|o| &o.network_spec),
        &spec_path.child("networkSpec"),
    ));

    if let Some(bastion) = &spec.bastion_spec.azure_bastion {
        errs.extend(validate_azure_bastion(
            bastion,
            &spec.network_spec.vnet,
            &spec_path.child("bastionSpec").child("azureBastion"),
        ));
    }

    errs
}

/// Network layout rules shared by clusters and cluster templates.
pub fn validate_network_spec(net: &NetworkSpec, old: Option<&NetworkSpec>, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();

    // A vnet resource group means the user brings a pre-existing vnet.
    let pre_existing = !net.vnet.resource_group.is_empty() || !net.vnet.id.is_empty();
    if !net.vnet.resource_group.is_empty() && !is_valid_resource_group(&net.vnet.resource_group) {
        errs.push(FieldError::invalid(
            &path.child("vnet").child("resourceGroup"),
            &net.vnet.resource_group,
            format!("resourceGroup doesn't match regex {RESOURCE_GROUP_REGEX}"),
        ));
    }
    errs.extend(validate_vnet_cidrs(&net.vnet, &path.child("vnet").child("cidrBlocks")));
    errs.extend(validate_subnets(&net.subnets, &net.vnet, pre_existing, &path.child("subnets")));

    let cp_cidrs: Vec<String> = net
        .control_plane_subnet()
        .map(|s| s.cidr_blocks.clone())
        .unwrap_or_default();
    errs.extend(validate_api_server_lb(
        &net.api_server_lb,
        old.map(|o| &o.api_server_lb),
        &cp_cidrs,
        &path.child("apiServerLB"),
    ));

    let needs_node_outbound = net.node_subnets().any(|s| !s.is_nat_gateway_enabled());
    errs.extend(validate_node_outbound_lb(
        net.node_outbound_lb.as_ref(),
        old.and_then(|o| o.node_outbound_lb.as_ref()),
        &net.api_server_lb,
        needs_node_outbound,
        &path.child("nodeOutboundLB"),
    ));
    errs.extend(validate_control_plane_outbound_lb(
        net.control_plane_outbound_lb.as_ref(),
        &net.api_server_lb,
        &path.child("controlPlaneOutboundLB"),
    ));
    errs.extend(validate_private_dns_zone_name(
        &net.private_dns_zone_name,
        &net.api_server_lb.type_,
        &path.child("privateDNSZoneName"),
    ));
    errs
}

pub(crate) fn validate_vnet_cidrs(vnet: &VnetSpec, path: &FieldPath) -> ErrorList {
    vnet.cidr_blocks
        .iter()
        .enumerate()
        .filter(|(_, cidr)| cidr.parse::<IpNet>().is_err())
        .map(|(i, cidr)| FieldError::invalid(&path.index(i), cidr, "invalid CIDR format"))
        .collect()
}

/// Subnet names, roles, CIDRs and security rules.
pub fn validate_subnets(
    subnets: &[SubnetSpec],
    vnet: &VnetSpec,
    require_roles: bool,
    path: &FieldPath,
) -> ErrorList {
    let mut errs = ErrorList::new();
    let mut names = HashSet::new();
    let mut missing_roles: BTreeSet<SubnetRole> = [SubnetRole::ControlPlane, SubnetRole::Node].into();

    for (i, subnet) in subnets.iter().enumerate() {
        let subnet_path = path.index(i);
        errs.extend(validate_subnet_name(&subnet.name, &subnet_path.child("name")));
        if !subnet.name.is_empty() && !names.insert(subnet.name.as_str()) {
            errs.push(FieldError::duplicate(&subnet_path.child("name"), &subnet.name));
        }
        match subnet.role {
            Some(SubnetRole::Cluster) => missing_roles.clear(),
            Some(role) => {
                missing_roles.remove(&role);
            }
            None => errs.push(FieldError::required(&subnet_path.child("role"), "subnet role is required")),
        }
        for (j, cidr) in subnet.cidr_blocks.iter().enumerate() {
            if let Some(err) = validate_subnet_cidr(cidr, &vnet.cidr_blocks, &subnet_path.child("cidrBlocks").index(j)) {
                errs.push(err);
            }
        }
        let rules_path = subnet_path.child("securityGroup").child("securityRules");
        for (j, rule) in subnet.security_group.security_rules.iter().enumerate() {
            errs.extend(validate_security_rule(rule, &rules_path.index(j)));
        }
    }

    if require_roles {
        for role in missing_roles {
            errs.push(FieldError::required(
                path,
                format!("required role {role} not included in provided subnets"),
            ));
        }
    }
    errs
}

fn validate_subnet_name(name: &str, path: &FieldPath) -> Option<FieldError> {
    (!is_valid_subnet_name(name)).then(|| {
        FieldError::invalid(path, name, format!("name of subnet doesn't match regex {SUBNET_NAME_REGEX}"))
    })
}

/// A subnet CIDR must parse and sit inside a vnet CIDR of the same family.
pub(crate) fn validate_subnet_cidr(cidr: &str, vnet_cidrs: &[String], path: &FieldPath) -> Option<FieldError> {
    let Ok(subnet) = cidr.parse::<IpNet>() else {
        return Some(FieldError::invalid(path, cidr, "invalid CIDR format"));
    };
    let contained = vnet_cidrs
        .iter()
        .filter_map(|c| c.parse::<IpNet>().ok())
        .any(|vnet| vnet.contains(&subnet));
    (!contained).then(|| {
        FieldError::invalid(
            path,
            cidr,
            format!("subnet CIDR not in vnet address space: {}", format_list(vnet_cidrs)),
        )
    })
}

pub(crate) fn validate_security_rule(rule: &SecurityRule, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if !(MIN_RULE_PRIORITY..=MAX_RULE_PRIORITY).contains(&rule.priority) {
        errs.push(FieldError::invalid(
            &path.child("priority"),
            &rule.priority,
            format!("security rule priorities should be between {MIN_RULE_PRIORITY} and {MAX_RULE_PRIORITY}"),
        ));
    }
    if rule.description.len() > SECURITY_RULE_DESCRIPTION_MAX_LENGTH {
        errs.push(FieldError::too_long(
            &path.child("description"),
            &rule.description,
            SECURITY_RULE_DESCRIPTION_MAX_LENGTH,
        ));
    }
    if !SECURITY_RULE_PROTOCOLS.contains(&rule.protocol.as_str()) {
        errs.push(FieldError::not_supported(&path.child("protocol"), &rule.protocol, &SECURITY_RULE_PROTOCOLS));
    }
    let directions = [SECURITY_RULE_DIRECTION_INBOUND, SECURITY_RULE_DIRECTION_OUTBOUND];
    if !rule.direction.is_empty() && !directions.contains(&rule.direction.as_str()) {
        errs.push(FieldError::not_supported(&path.child("direction"), &rule.direction, &directions));
    }
    errs
}

/// Rules for the API server load balancer, plus immutability when `old` is set.
pub fn validate_api_server_lb(
    lb: &LoadBalancerSpec,
    old: Option<&LoadBalancerSpec>,
    cp_cidrs: &[String],
    path: &FieldPath,
) -> ErrorList {
    let mut errs = validate_lb_class(lb, path);

    if !is_valid_load_balancer_name(&lb.name) {
        errs.push(FieldError::invalid(
            &path.child("name"),
            &lb.name,
            format!("name of load balancer doesn't match regex {LOAD_BALANCER_NAME_REGEX}"),
        ));
    }

    if lb.frontend_ips.len() == 1 {
        let frontend_path = path.child("frontendIPs").index(0);
        let frontend = &lb.frontend_ips[0];
        if lb.is_public() && !frontend.private_ip_address.is_empty() {
            errs.push(FieldError::forbidden(
                &frontend_path.child("privateIP"),
                "Public Load Balancers cannot have a Private IP",
            ));
        }
        if lb.is_internal() {
            if frontend.public_ip.is_some() {
                errs.push(FieldError::forbidden(
                    &frontend_path.child("publicIP"),
                    "Internal Load Balancers cannot have a Public IP",
                ));
            }
            if !frontend.private_ip_address.is_empty() {
                errs.extend(validate_internal_lb_ip(
                    &frontend.private_ip_address,
                    cp_cidrs,
                    &frontend_path.child("privateIP"),
                ));
            }
        }
    } else {
        errs.push(FieldError::invalid(
            &path.child("frontendIPs"),
            &lb.frontend_ips,
            "API Server Load balancer should have 1 Frontend IP configuration",
        ));
    }

    if let Some(old) = old {
        let immutable = [
            ("sku", &old.sku, &lb.sku, "API Server load balancer SKU should not be modified after AzureCluster creation."),
            ("type", &old.type_, &lb.type_, "API Server load balancer type should not be modified after AzureCluster creation."),
            ("name", &old.name, &lb.name, "API Server load balancer name should not be modified after AzureCluster creation."),
        ];
        for (field, old_value, new_value, detail) in immutable {
            if !old_value.is_empty() && old_value != new_value {
                errs.push(FieldError::invalid(&path.child(field), new_value, detail));
            }
        }
        if lb.is_internal() {
            let old_ip = old.frontend_ips.first().map(|f| f.private_ip_address.as_str()).unwrap_or_default();
            let new_ip = lb.frontend_ips.first().map(|f| f.private_ip_address.as_str()).unwrap_or_default();
            if !old_ip.is_empty() && old_ip != new_ip {
                errs.push(FieldError::invalid(
                    &path.child("frontendIPs").index(0).child("privateIP"),
                    new_ip,
                    "API Server load balancer private IP should not be modified after AzureCluster creation.",
                ));
            }
        }
    }
    errs
}

fn validate_internal_lb_ip(ip: &str, cp_cidrs: &[String], path: &FieldPath) -> Option<FieldError> {
    let Ok(addr) = ip.parse::<IpAddr>() else {
        return Some(FieldError::invalid(
            path,
            ip,
            "Internal LB IP address isn't a valid IPv4 or IPv6 address",
        ));
    };
    let in_range = cp_cidrs
        .iter()
        .filter_map(|c| c.parse::<IpNet>().ok())
        .any(|net| net.contains(&addr));
    (!in_range).then(|| {
        FieldError::invalid(
            path,
            ip,
            format!(
                "Internal LB IP address needs to be in control plane subnet range ({})",
                format_list(cp_cidrs)
            ),
        )
    })
}

/// SKU and type checks common to every load balancer.
pub fn validate_lb_class(lb: &LoadBalancerSpec, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if lb.sku != SKU_STANDARD {
        errs.push(FieldError::not_supported(&path.child("sku"), &lb.sku, &[SKU_STANDARD]));
    }
    if lb.type_ != LB_TYPE_PUBLIC && lb.type_ != LB_TYPE_INTERNAL {
        errs.push(FieldError::not_supported(
            &path.child("type"),
            &lb.type_,
            &[LB_TYPE_PUBLIC, LB_TYPE_INTERNAL],
        ));
    }
    errs
}

pub(crate) fn validate_frontend_ips_count(lb: &LoadBalancerSpec, path: &FieldPath) -> Option<FieldError> {
    let count = lb.frontend_ips_count?;
    (count > MAX_LOAD_BALANCER_OUTBOUND_IPS).then(|| {
        FieldError::invalid(
            &path.child("frontendIPsCount"),
            &count,
            format!("Max front end ips allowed is {MAX_LOAD_BALANCER_OUTBOUND_IPS}"),
        )
    })
}

/// Node outbound load balancer presence and immutability.
pub fn validate_node_outbound_lb(
    lb: Option<&LoadBalancerSpec>,
    old: Option<&LoadBalancerSpec>,
    api_server_lb: &LoadBalancerSpec,
    needs_outbound: bool,
    path: &FieldPath,
) -> ErrorList {
    let mut errs = ErrorList::new();
    let Some(lb) = lb else {
        if api_server_lb.is_public() && needs_outbound {
            errs.push(FieldError::required(path, "Node outbound load balancer cannot be nil for public clusters."));
        }
        return errs;
    };

    if api_server_lb.is_internal() {
        errs.push(FieldError::forbidden(path, "Node outbound load balancer cannot be set for private clusters."));
    }

    if let Some(old) = old {
        let immutable = [
            ("id", &old.id, &lb.id, "Node outbound load balancer ID should not be modified after AzureCluster creation."),
            ("name", &old.name, &lb.name, "Node outbound load balancer Name should not be modified after AzureCluster creation."),
            ("sku", &old.sku, &lb.sku, "Node outbound load balancer SKU should not be modified after AzureCluster creation."),
        ];
        for (field, old_value, new_value, detail) in immutable {
            if old_value != new_value {
                errs.push(FieldError::invalid(&path.child(field), new_value, detail));
            }
        }
        // Changing the count regenerates the frontends; otherwise they are fixed.
        if old.frontend_ips_count == lb.frontend_ips_count && old.frontend_ips != lb.frontend_ips {
            errs.push(FieldError::invalid(
                &path.child("frontendIPs"),
                &lb.frontend_ips,
                "Node outbound load balancer FrontendIPs cannot be modified after AzureCluster creation.",
            ));
        }
    }

    errs.extend(validate_frontend_ips_count(lb, path));
    errs
}

/// Control plane outbound load balancer is only valid for private clusters.
pub fn validate_control_plane_outbound_lb(
    lb: Option<&LoadBalancerSpec>,
    api_server_lb: &LoadBalancerSpec,
    path: &FieldPath,
) -> ErrorList {
    let mut errs = ErrorList::new();
    let Some(lb) = lb else {
        return errs;
    };
    if api_server_lb.is_public() {
        errs.push(FieldError::forbidden(
            path,
            "Control plane outbound load balancer cannot be set for public clusters.",
        ));
    }
    errs.extend(validate_frontend_ips_count(lb, path));
    errs
}

/// Private DNS zones need an internal API server load balancer.
pub fn validate_private_dns_zone_name(name: &str, api_server_lb_type: &str, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if name.is_empty() {
        return errs;
    }
    if api_server_lb_type != LB_TYPE_INTERNAL {
        errs.push(FieldError::invalid(
            path,
            api_server_lb_type,
            "PrivateDNSZoneName is available only if APIServerLB.Type is Internal",
        ));
    }
    if !is_valid_private_dns_zone_name(name) {
        errs.push(FieldError::invalid(
            path,
            name,
            format!("PrivateDNSZoneName can only contain alphanumeric characters, underscores and hyphens, cannot start or end with a hyphen, and must match regex {PRIVATE_DNS_ZONE_NAME_REGEX}"),
        ));
    }
    errs
}

fn validate_azure_bastion(bastion: &AzureBastion, vnet: &VnetSpec, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    let subnet_path = path.child("subnet");
    if !bastion.subnet.name.is_empty() && bastion.subnet.name != naming::AZURE_BASTION_SUBNET_NAME {
        errs.push(FieldError::invalid(
            &subnet_path.child("name"),
            &bastion.subnet.name,
            format!("Azure Bastion subnet name should be {}", naming::AZURE_BASTION_SUBNET_NAME),
        ));
    }
    for (i, cidr) in bastion.subnet.cidr_blocks.iter().enumerate() {
        if let Some(err) = validate_subnet_cidr(cidr, &vnet.cidr_blocks, &subnet_path.child("cidrBlocks").index(i)) {
            errs.push(err);
        }
    }
    errs
}

pub(crate) fn validate_cloud_provider_config_overrides(
    overrides: &CloudProviderConfigOverrides,
    path: &FieldPath,
) -> ErrorList {
    let mut errs = ErrorList::new();
    let mut names = HashSet::new();
    for (i, limit) in overrides.rate_limits.iter().enumerate() {
        let name_path = path.child("rateLimits").index(i).child("name");
        if !SUPPORTED_RATE_LIMIT_NAMES.contains(&limit.name.as_str()) {
            errs.push(FieldError::not_supported(&name_path, &limit.name, &SUPPORTED_RATE_LIMIT_NAMES));
        }
        if !names.insert(limit.name.as_str()) {
            errs.push(FieldError::duplicate(&name_path, &limit.name));
        }
    }
    errs
}

/// Fields fixed after creation.
pub fn validate_cluster_immutable(new: &AzureClusterSpec, old: &AzureClusterSpec) -> ErrorList {
    let mut errs = ErrorList::new();
    let spec = FieldPath::new("spec");

    let scalars = [
        ("ResourceGroup", &old.resource_group, &new.resource_group),
        ("SubscriptionID", &old.subscription_id, &new.subscription_id),
        ("Location", &old.location, &new.location),
    ];
    for (field, old_value, new_value) in scalars {
        if old_value != new_value {
            errs.push(FieldError::invalid(&spec.child(field), new_value, IMMUTABLE));
        }
    }

    // Objects stored before the environment was defaulted carry an empty value.
    let old_environment = if old.azure_environment.is_empty() {
        AZURE_PUBLIC_CLOUD
    } else {
        old.azure_environment.as_str()
    };
    if old_environment != new.azure_environment {
        errs.push(FieldError::invalid(&spec.child("AzureEnvironment"), &new.azure_environment, IMMUTABLE));
    }

    let network = spec.child("NetworkSpec");
    if old.network_spec.private_dns_zone_name != new.network_spec.private_dns_zone_name {
        errs.push(FieldError::invalid(
            &network.child("PrivateDNSZoneName"),
            &new.network_spec.private_dns_zone_name,
            IMMUTABLE,
        ));
    }
    if old.network_spec.control_plane_outbound_lb != new.network_spec.control_plane_outbound_lb {
        errs.push(FieldError::invalid(
            &network.child("ControlPlaneOutboundLB"),
            &new.network_spec.control_plane_outbound_lb,
            IMMUTABLE,
        ));
    }

    if old.cloud_provider_config_overrides != new.cloud_provider_config_overrides {
        errs.push(FieldError::invalid(
            &spec.child("CloudProviderConfigOverrides"),
            &new.cloud_provider_config_overrides,
            "cannot change cloudProviderConfigOverrides cluster creation",
        ));
    }

    let bastion = spec.child("BastionSpec").child("AzureBastion");
    match (&old.bastion_spec.azure_bastion, &new.bastion_spec.azure_bastion) {
        (Some(_), None) => errs.push(FieldError::invalid(
            &bastion,
            &new.bastion_spec.azure_bastion,
            "azure bastion cannot be removed from a cluster",
        )),
        (Some(old_bastion), Some(new_bastion)) if old_bastion != new_bastion => {
            errs.push(FieldError::invalid(&bastion, new_bastion, IMMUTABLE));
        }
        _ => {}
    }

    let endpoint = spec.child("ControlPlaneEndpoint");
    let (old_ep, new_ep) = (&old.control_plane_endpoint, &new.control_plane_endpoint);
    if !old_ep.host.is_empty() && old_ep.host != new_ep.host {
        errs.push(FieldError::invalid(&endpoint.child("Host"), &new_ep.host, IMMUTABLE));
    }
    if old_ep.port != 0 && old_ep.port != new_ep.port {
        errs.push(FieldError::invalid(&endpoint.child("Port"), &new_ep.port, IMMUTABLE));
    }
    errs
}
