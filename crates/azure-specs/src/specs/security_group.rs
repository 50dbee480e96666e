//! Network security group spec
//!
//! Rules added out of band are kept: an update carries the desired rules
//! followed by every existing rule whose name is not desired.

use std::any::Any;

use azure_crds::v1beta1::{self, Tags};
use tracing::debug;

use super::owned_tags;
use crate::error::SpecError;
use crate::models::{SecurityGroup, SecurityGroupProperties, SecurityRule, SecurityRuleProperties};
use crate::spec_trait::{ResourceSpecGetter, existing_as};

const ANY: &str = "*";

/// Desired state of a network security group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityGroupSpec {
    /// NSG name
    pub name: String,
    /// Cluster resource group
    pub resource_group: String,
    /// Azure region
    pub location: String,
    /// Rules owned by the cluster
    pub security_rules: Vec<v1beta1::SecurityRule>,
    /// Owning cluster, used for the ownership tag
    pub cluster_name: String,
    /// Extra tags merged with the ownership tags
    pub additional_tags: Tags,
}

impl From<&v1beta1::SecurityRule> for SecurityRule {
    fn from(rule: &v1beta1::SecurityRule) -> Self {
        let or_any = |value: &Option<String>| Some(value.clone().unwrap_or_else(|| ANY.to_string()));
        SecurityRule {
            name: rule.name.clone(),
            properties: SecurityRuleProperties {
                description: (!rule.description.is_empty()).then(|| rule.description.clone()),
                protocol: rule.protocol.clone(),
                direction: rule.direction.clone(),
                priority: rule.priority,
                access: "Allow".to_string(),
                source_address_prefix: or_any(&rule.source),
                source_port_range: or_any(&rule.source_ports),
                destination_address_prefix: or_any(&rule.destination),
                destination_port_range: or_any(&rule.destination_ports),
            },
        }
    }
}

impl SecurityGroupSpec {
    fn desired_rules(&self) -> Vec<SecurityRule> {
        self.security_rules.iter().map(SecurityRule::from).collect()
    }
}

impl ResourceSpecGetter for SecurityGroupSpec {
    type Parameters = SecurityGroup;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<SecurityGroup>, SpecError> {
        let desired = self.desired_rules();
        let mut etag = None;
        let mut rules = desired.clone();

        if let Some(existing) = existing_as::<SecurityGroup>(existing)? {
            let current = &existing.properties.security_rules;
            let up_to_date = desired.iter().all(|rule| current.contains(rule));
            if up_to_date {
                debug!(nsg = %self.name, "security rules are up to date");
                return Ok(None);
            }
            rules.extend(
                current
                    .iter()
                    .filter(|rule| !desired.iter().any(|d| d.name == rule.name))
                    .cloned(),
            );
            etag.clone_from(&existing.etag);
        }

        Ok(Some(SecurityGroup {
            location: self.location.clone(),
            tags: owned_tags(&self.cluster_name, &self.name, None, &self.additional_tags),
            etag,
            properties: SecurityGroupProperties { security_rules: rules },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ssh_rule() -> v1beta1::SecurityRule {
        v1beta1::SecurityRule {
            name: "allow_ssh".to_string(),
            description: "Allow SSH".to_string(),
            protocol: "Tcp".to_string(),
            direction: v1beta1::SECURITY_RULE_DIRECTION_INBOUND.to_string(),
            priority: 2200,
            source: Some("*".to_string()),
            source_ports: Some("*".to_string()),
            destination: Some("*".to_string()),
            destination_ports: Some("22".to_string()),
        }
    }

    fn spec() -> SecurityGroupSpec {
        SecurityGroupSpec {
            name: "foo-controlplane-nsg".to_string(),
            resource_group: "foo".to_string(),
            location: "eastus".to_string(),
            security_rules: vec![ssh_rule()],
            cluster_name: "foo".to_string(),
            additional_tags: Tags::new(),
        }
    }

    fn custom_rule() -> SecurityRule {
        SecurityRule {
            name: "custom".to_string(),
            properties: SecurityRuleProperties {
                protocol: "Udp".to_string(),
                direction: "Outbound".to_string(),
                priority: 100,
                access: "Deny".to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_rule_conversion_fills_wildcards() {
        let mut rule = ssh_rule();
        rule.source = None;
        rule.description = String::new();
        let converted = SecurityRule::from(&rule);
        assert_eq!(converted.properties.source_address_prefix.as_deref(), Some("*"));
        assert_eq!(converted.properties.destination_port_range.as_deref(), Some("22"));
        assert_eq!(converted.properties.description, None);
        assert_eq!(converted.properties.access, "Allow");
    }

    #[test]
    fn test_new_security_group() {
        let nsg = spec().parameters(None).unwrap().unwrap();
        assert_eq!(nsg.properties.security_rules.len(), 1);
        assert_eq!(nsg.etag, None);
        assert!(nsg.tags.has_owned("foo"));
    }

    #[test]
    fn test_existing_with_all_rules() {
        let existing = SecurityGroup {
            etag: Some("W/\"1\"".to_string()),
            properties: SecurityGroupProperties {
                security_rules: vec![custom_rule(), SecurityRule::from(&ssh_rule())],
            },
            ..Default::default()
        };
        assert!(spec().parameters(Some(&existing)).unwrap().is_none());
    }

    #[test]
    fn test_existing_rules_are_kept_on_update() {
        let existing = SecurityGroup {
            etag: Some("W/\"1\"".to_string()),
            properties: SecurityGroupProperties {
                security_rules: vec![custom_rule()],
            },
            ..Default::default()
        };
        let nsg = spec().parameters(Some(&existing)).unwrap().unwrap();
        let names: Vec<&str> = nsg.properties.security_rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["allow_ssh", "custom"]);
        assert_eq!(nsg.etag.as_deref(), Some("W/\"1\""));
    }

    #[test]
    fn test_changed_rule_is_replaced() {
        let mut stale = SecurityRule::from(&ssh_rule());
        stale.properties.priority = 4000;
        let existing = SecurityGroup {
            properties: SecurityGroupProperties {
                security_rules: vec![stale],
            },
            ..Default::default()
        };
        let nsg = spec().parameters(Some(&existing)).unwrap().unwrap();
        assert_eq!(nsg.properties.security_rules.len(), 1);
        assert_eq!(nsg.properties.security_rules[0].properties.priority, 2200);
    }
}
