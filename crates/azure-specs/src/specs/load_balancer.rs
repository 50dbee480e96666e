//! Load balancer spec
//!
//! One spec covers the three load balancers of a cluster. The API server
//! load balancer carries the HTTPS probe and rule; a public one also owns
//! the outbound rule for control plane egress. Outbound load balancers only
//! carry the outbound rule.

use std::any::Any;

use azure_crds::v1beta1::tags::{API_SERVER_ROLE, CONTROL_PLANE_OUTBOUND_ROLE, NODE_OUTBOUND_ROLE};
use azure_crds::v1beta1::{self, LB_TYPE_INTERNAL, Tags};

use super::owned_tags;
use crate::error::SpecError;
use crate::ids;
use crate::models::{
    BackendAddressPool, FrontendIPConfiguration, FrontendIPConfigurationProperties, LoadBalancer,
    LoadBalancerProperties, LoadBalancingRule, LoadBalancingRuleProperties, OutboundRule,
    OutboundRuleProperties, Probe, ProbeProperties, Sku, SubResource,
};
use crate::names::{API_SERVER_LB_RULE_NAME, API_SERVER_PROBE_NAME, OUTBOUND_NAT_RULE_NAME};
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Default API server port.
pub const DEFAULT_API_SERVER_PORT: i32 = 6443;

/// What a load balancer is for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadBalancerRole {
    /// Fronts the control plane machines
    #[default]
    ApiServer,
    /// Egress of worker machines
    NodeOutbound,
    /// Egress of control plane machines behind an internal API server load balancer
    ControlPlaneOutbound,
}

impl LoadBalancerRole {
    /// Role tag value.
    pub fn tag(self) -> &'static str {
        match self {
            LoadBalancerRole::ApiServer => API_SERVER_ROLE,
            LoadBalancerRole::NodeOutbound => NODE_OUTBOUND_ROLE,
            LoadBalancerRole::ControlPlaneOutbound => CONTROL_PLANE_OUTBOUND_ROLE,
        }
    }
}

/// Desired state of a load balancer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LBSpec {
    pub name: String,
    pub resource_group: String,
    pub subscription_id: String,
    pub location: String,
    pub role: LoadBalancerRole,
    pub type_: String,
    pub sku: String,
    pub frontend_ips: Vec<v1beta1::FrontendIP>,
    /// Frontend subnet of an internal load balancer
    pub subnet_name: String,
    pub vnet_name: String,
    pub vnet_resource_group: String,
    pub backend_pool_name: String,
    pub idle_timeout_in_minutes: Option<i32>,
    pub api_server_port: i32,
    pub cluster_name: String,
    pub additional_tags: Tags,
}

impl LBSpec {
    fn is_internal(&self) -> bool {
        self.type_ == LB_TYPE_INTERNAL
    }

    fn child_ref(&self, id: fn(&str, &str, &str, &str) -> String, name: &str) -> SubResource {
        SubResource::new(id(&self.subscription_id, &self.resource_group, &self.name, name))
    }

    fn frontend(&self, frontend: &v1beta1::FrontendIP) -> Result<FrontendIPConfiguration, SpecError> {
        let properties = if self.is_internal() {
            if frontend.private_ip_address.is_empty() {
                return Err(SpecError::MissingParameter(format!(
                    "private IP of frontend {} on internal load balancer {}",
                    frontend.name, self.name
                )));
            }
            FrontendIPConfigurationProperties {
                private_ip_allocation_method: Some("Static".to_string()),
                private_ip_address: Some(frontend.private_ip_address.clone()),
                subnet: Some(SubResource::new(ids::subnet_id(
                    &self.subscription_id,
                    &self.vnet_resource_group,
                    &self.vnet_name,
                    &self.subnet_name,
                ))),
                public_ip_address: None,
            }
        } else {
            let ip = frontend.public_ip.as_ref().ok_or_else(|| {
                SpecError::MissingParameter(format!(
                    "public IP of frontend {} on load balancer {}",
                    frontend.name, self.name
                ))
            })?;
            FrontendIPConfigurationProperties {
                public_ip_address: Some(SubResource::new(ids::public_ip_id(
                    &self.subscription_id,
                    &self.resource_group,
                    &ip.name,
                ))),
                ..Default::default()
            }
        };
        Ok(FrontendIPConfiguration {
            name: frontend.name.clone(),
            properties,
        })
    }

    fn outbound_rule(&self) -> OutboundRule {
        OutboundRule {
            name: OUTBOUND_NAT_RULE_NAME.to_string(),
            properties: OutboundRuleProperties {
                protocol: "All".to_string(),
                idle_timeout_in_minutes: self.idle_timeout_in_minutes,
                frontend_ip_configurations: self
                    .frontend_ips
                    .iter()
                    .map(|f| self.child_ref(ids::frontend_ip_config_id, &f.name))
                    .collect(),
                backend_address_pool: self.child_ref(ids::backend_pool_id, &self.backend_pool_name),
            },
        }
    }

    fn api_server_rules(&self) -> Result<(Vec<Probe>, Vec<LoadBalancingRule>), SpecError> {
        let first = self.frontend_ips.first().ok_or_else(|| {
            SpecError::MissingParameter(format!("frontend IP of load balancer {}", self.name))
        })?;
        let port = if self.api_server_port > 0 { self.api_server_port } else { DEFAULT_API_SERVER_PORT };
        let probe = Probe {
            name: API_SERVER_PROBE_NAME.to_string(),
            properties: ProbeProperties {
                protocol: "Https".to_string(),
                port,
                request_path: Some("/readyz".to_string()),
                interval_in_seconds: 15,
                number_of_probes: 4,
            },
        };
        let rule = LoadBalancingRule {
            name: API_SERVER_LB_RULE_NAME.to_string(),
            properties: LoadBalancingRuleProperties {
                protocol: "Tcp".to_string(),
                frontend_port: port,
                backend_port: port,
                idle_timeout_in_minutes: self.idle_timeout_in_minutes,
                enable_floating_ip: false,
                load_distribution: "Default".to_string(),
                frontend_ip_configuration: self.child_ref(ids::frontend_ip_config_id, &first.name),
                backend_address_pool: self.child_ref(ids::backend_pool_id, &self.backend_pool_name),
                probe: self.child_ref(ids::probe_id, API_SERVER_PROBE_NAME),
                disable_outbound_snat: !self.is_internal(),
            },
        };
        Ok((vec![probe], vec![rule]))
    }
}

impl ResourceSpecGetter for LBSpec {
    type Parameters = LoadBalancer;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<LoadBalancer>, SpecError> {
        if existing_as::<LoadBalancer>(existing)?.is_some() {
            return Ok(None);
        }

        let frontend_ip_configurations = self
            .frontend_ips
            .iter()
            .map(|f| self.frontend(f))
            .collect::<Result<Vec<_>, _>>()?;

        let (probes, load_balancing_rules) = match self.role {
            LoadBalancerRole::ApiServer => self.api_server_rules()?,
            LoadBalancerRole::NodeOutbound | LoadBalancerRole::ControlPlaneOutbound => (Vec::new(), Vec::new()),
        };
        let outbound_rules = if self.is_internal() {
            Vec::new()
        } else {
            vec![self.outbound_rule()]
        };

        Ok(Some(LoadBalancer {
            location: self.location.clone(),
            tags: owned_tags(&self.cluster_name, &self.name, Some(self.role.tag()), &self.additional_tags),
            sku: Sku::new(self.sku.clone()),
            properties: LoadBalancerProperties {
                frontend_ip_configurations,
                backend_address_pools: vec![BackendAddressPool {
                    name: self.backend_pool_name.clone(),
                }],
                load_balancing_rules,
                probes,
                outbound_rules,
            },
        }))
    }
}
