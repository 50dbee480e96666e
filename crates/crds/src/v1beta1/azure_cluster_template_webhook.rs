//! AzureClusterTemplate defaulting and validation
//!
//! A template carries no cluster name, so only name-independent defaults
//! and rules apply. The template spec is frozen once created.

use kube::ResourceExt;
use tracing::debug;

use super::azure_cluster::{AZURE_PUBLIC_CLOUD, SUPPORTED_CLOUD_ENVIRONMENTS};
use super::azure_cluster_template::{AzureClusterTemplate, AzureClusterTemplateResourceSpec};
use super::azure_cluster_validation::{
    validate_cloud_provider_config_overrides, validate_control_plane_outbound_lb, validate_lb_class,
    validate_node_outbound_lb, validate_private_dns_zone_name, validate_security_rule,
    validate_subnet_cidr, validate_vnet_cidrs,
};
use crate::GROUP;
use crate::error::ApiError;
use crate::field::{ErrorList, FieldError, FieldPath};
use crate::webhook::{Defaulter, Validator};

/// Rejection detail for any change to a cluster template's spec.
pub const AZURE_CLUSTER_TEMPLATE_IMMUTABLE_MSG: &str = "AzureClusterTemplate spec.template.spec field is immutable. Please create new resource instead. ref doc: https://cluster-api.sigs.k8s.io/tasks/experimental-features/cluster-class/change-clusterclass.html";

impl Defaulter for AzureClusterTemplate {
    fn set_defaults(&mut self) -> Result<(), ApiError> {
        debug!("Defaulting AzureClusterTemplate {}", self.name_any());
        self.spec.template.spec.set_defaults();
        Ok(())
    }
}

impl AzureClusterTemplateResourceSpec {
    /// Name-independent defaults.
    pub fn set_defaults(&mut self) {
        if self.azure_environment.is_empty() {
            self.azure_environment = AZURE_PUBLIC_CLOUD.to_string();
        }
        self.network_spec.set_class_defaults();
        self.bastion_spec.set_class_defaults();
    }
}

impl Validator for AzureClusterTemplate {
    fn validate_create(&self) -> Result<(), ApiError> {
        let name = self.name_any();
        let errs = validate_cluster_template_spec(
            &self.spec.template.spec,
            &FieldPath::new("spec").child("template").child("spec"),
        );
        debug!("AzureClusterTemplate {} create validation found {} errors", name, errs.len());
        ApiError::check("AzureClusterTemplate", GROUP, &name, errs)
    }

    fn validate_update(&self, old: &Self) -> Result<(), ApiError> {
        let name = self.name_any();
        let mut errs = ErrorList::new();
        let mut old = old.clone();
        old.set_defaults()?;
        if old.spec.template.spec != self.spec.template.spec {
            errs.push(FieldError::invalid(
                &FieldPath::new("AzureClusterTemplate").child("spec").child("template").child("spec"),
                &self.spec.template.spec,
                AZURE_CLUSTER_TEMPLATE_IMMUTABLE_MSG,
            ));
        }
        ApiError::check("AzureClusterTemplate", GROUP, &name, errs)
    }
}

/// Class-level rules on a template spec.
pub fn validate_cluster_template_spec(spec: &AzureClusterTemplateResourceSpec, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    let net = &spec.network_spec;
    let net_path = path.child("networkSpec");

    if !spec.azure_environment.is_empty()
        && !SUPPORTED_CLOUD_ENVIRONMENTS.contains(&spec.azure_environment.as_str())
    {
        errs.push(FieldError::not_supported(
            &path.child("azureEnvironment"),
            &spec.azure_environment,
            &SUPPORTED_CLOUD_ENVIRONMENTS,
        ));
    }
    if let Some(overrides) = &spec.cloud_provider_config_overrides {
        errs.extend(validate_cloud_provider_config_overrides(
            overrides,
            &path.child("cloudProviderConfigOverrides"),
        ));
    }

    errs.extend(validate_vnet_cidrs(&net.vnet, &net_path.child("vnet").child("cidrBlocks")));
    for (i, subnet) in net.subnets.iter().enumerate() {
        let subnet_path = net_path.child("subnets").index(i);
        if subnet.role.is_none() {
            errs.push(FieldError::required(&subnet_path.child("role"), "subnet role is required"));
        }
        for (j, cidr) in subnet.cidr_blocks.iter().enumerate() {
            errs.extend(validate_subnet_cidr(cidr, &net.vnet.cidr_blocks, &subnet_path.child("cidrBlocks").index(j)));
        }
        let rules_path = subnet_path.child("securityGroup").child("securityRules");
        for (j, rule) in subnet.security_group.security_rules.iter().enumerate() {
            errs.extend(validate_security_rule(rule, &rules_path.index(j)));
        }
    }

    errs.extend(validate_lb_class(&net.api_server_lb, &net_path.child("apiServerLB")));
    let needs_node_outbound = net.node_subnets().any(|s| !s.is_nat_gateway_enabled());
    errs.extend(validate_node_outbound_lb(
        net.node_outbound_lb.as_ref(),
        None,
        &net.api_server_lb,
        needs_node_outbound,
        &net_path.child("nodeOutboundLB"),
    ));
    errs.extend(validate_control_plane_outbound_lb(
        net.control_plane_outbound_lb.as_ref(),
        &net.api_server_lb,
        &net_path.child("controlPlaneOutboundLB"),
    ));
    errs.extend(validate_private_dns_zone_name(
        &net.private_dns_zone_name,
        &net.api_server_lb.type_,
        &net_path.child("privateDNSZoneName"),
    ));
    errs
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;
    use crate::v1beta1::{AzureClusterTemplateResource, AzureClusterTemplateSpec, LB_TYPE_INTERNAL, SubnetRole};

    fn create_template(name: &str) -> AzureClusterTemplate {
        AzureClusterTemplate {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: AzureClusterTemplateSpec {
                template: AzureClusterTemplateResource {
                    spec: AzureClusterTemplateResourceSpec {
                        location: "westus2".to_string(),
                        ..Default::default()
                    },
                },
            },
        }
    }

    #[test]
    fn test_template_class_defaults() {
        let mut template = create_template("template");
        template.set_defaults().unwrap();
        let spec = &template.spec.template.spec;

        assert_eq!(spec.azure_environment, AZURE_PUBLIC_CLOUD);
        assert_eq!(spec.network_spec.vnet.cidr_blocks, vec!["10.0.0.0/8"]);
        assert!(spec.network_spec.vnet.name.is_empty(), "Names depend on the cluster");
        let roles: Vec<_> = spec.network_spec.subnets.iter().map(|s| s.role).collect();
        assert_eq!(roles, vec![Some(SubnetRole::ControlPlane), Some(SubnetRole::Node)]);
        assert!(spec.network_spec.subnets.iter().all(|s| s.name.is_empty()));
        let outbound = spec.network_spec.node_outbound_lb.as_ref().unwrap();
        assert_eq!(outbound.frontend_ips_count, Some(1));
        assert!(outbound.frontend_ips.is_empty());
    }

    #[test]
    fn test_defaulted_template_is_valid() {
        let mut template = create_template("template");
        template.set_defaults().unwrap();
        assert!(template.validate_create().is_ok());
    }

    #[test]
    fn test_private_template_rejects_node_outbound_lb() {
        let mut template = create_template("template");
        template.set_defaults().unwrap();
        template.spec.template.spec.network_spec.api_server_lb.type_ = LB_TYPE_INTERNAL.to_string();
        let err = template.validate_create().unwrap_err();
        assert!(
            err.field_errors()
                .iter()
                .any(|e| e.field == "spec.template.spec.networkSpec.nodeOutboundLB"),
            "{err}"
        );
    }

    #[test]
    fn test_template_spec_is_immutable() {
        let old = create_template("template");
        let mut new = old.clone();
        new.set_defaults().unwrap();
        assert!(new.validate_update(&old).is_ok(), "Defaults alone are not a change");

        new.spec.template.spec.location = "eastus".to_string();
        let err = new.validate_update(&old).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "AzureClusterTemplate.spec.template.spec");
        assert_eq!(err.field_errors()[0].detail, AZURE_CLUSTER_TEMPLATE_IMMUTABLE_MSG);
    }
}
