//! Inbound NAT rule spec
//!
//! Each control plane machine gets an SSH NAT rule on the API server load
//! balancer. The first machine takes frontend port 22; later ones take the
//! first free port in 2201..=2220.

use std::any::Any;

use crate::error::SpecError;
use crate::ids;
use crate::models::{InboundNatRule, InboundNatRuleProperties, SubResource};
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Backend SSH port.
pub const SSH_PORT: i32 = 22;
const EXTRA_SSH_PORTS: std::ops::RangeInclusive<i32> = 2201..=2220;

/// Desired SSH NAT rule of one machine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundNatSpec {
    pub name: String,
    pub load_balancer_name: String,
    pub resource_group: String,
    pub subscription_id: String,
    pub frontend_ip_name: String,
    /// Used to pick a free frontend port
    pub rules_on_load_balancer: Vec<InboundNatRule>,
}

impl InboundNatSpec {
    /// First frontend port not used by another rule.
    pub fn available_port(&self) -> Result<i32, SpecError> {
        let used = |port: i32| {
            self.rules_on_load_balancer
                .iter()
                .any(|rule| rule.name != self.name && rule.properties.frontend_port == port)
        };
        std::iter::once(SSH_PORT)
            .chain(EXTRA_SSH_PORTS)
            .find(|port| !used(*port))
            .ok_or_else(|| SpecError::NoAvailablePort {
                lb: self.load_balancer_name.clone(),
            })
    }
}

impl ResourceSpecGetter for InboundNatSpec {
    type Parameters = InboundNatRule;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn owner_resource_name(&self) -> &str {
        &self.load_balancer_name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<InboundNatRule>, SpecError> {
        if existing_as::<InboundNatRule>(existing)?.is_some() {
            return Ok(None);
        }
        let frontend_port = self.available_port()?;
        Ok(Some(InboundNatRule {
            name: self.name.clone(),
            properties: InboundNatRuleProperties {
                frontend_ip_configuration: SubResource::new(ids::frontend_ip_config_id(
                    &self.subscription_id,
                    &self.resource_group,
                    &self.load_balancer_name,
                    &self.frontend_ip_name,
                )),
                protocol: "Tcp".to_string(),
                frontend_port,
                backend_port: SSH_PORT,
                enable_floating_ip: false,
                idle_timeout_in_minutes: Some(4),
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, port: i32) -> InboundNatRule {
        InboundNatRule {
            name: name.to_string(),
            properties: InboundNatRuleProperties {
                frontend_port: port,
                ..Default::default()
            },
        }
    }

    fn spec(rules: Vec<InboundNatRule>) -> InboundNatSpec {
        InboundNatSpec {
            name: "foo-control-plane-abcde".to_string(),
            load_balancer_name: "foo-public-lb".to_string(),
            resource_group: "foo".to_string(),
            subscription_id: "123".to_string(),
            frontend_ip_name: "foo-public-lb-frontEnd".to_string(),
            rules_on_load_balancer: rules,
        }
    }

    #[test]
    fn test_first_machine_gets_port_22() {
        let rule = spec(Vec::new()).parameters(None).unwrap().unwrap();
        assert_eq!(rule.properties.frontend_port, 22);
        assert_eq!(rule.properties.backend_port, 22);
        assert_eq!(
            rule.properties.frontend_ip_configuration.id,
            ids::frontend_ip_config_id("123", "foo", "foo-public-lb", "foo-public-lb-frontEnd")
        );
    }

    #[test]
    fn test_next_free_port() {
        let spec = spec(vec![rule("cp-0", 22), rule("cp-1", 2201), rule("cp-2", 2203)]);
        assert_eq!(spec.available_port().unwrap(), 2202);
    }

    #[test]
    fn test_own_rule_does_not_block_its_port() {
        let spec = spec(vec![rule("foo-control-plane-abcde", 22)]);
        assert_eq!(spec.available_port().unwrap(), 22);
    }

    #[test]
    fn test_ports_exhausted() {
        let mut rules = vec![rule("cp", 22)];
        rules.extend((2201..=2220).map(|port| rule(&format!("cp-{port}"), port)));
        let err = spec(rules).parameters(None).unwrap_err();
        assert_eq!(err.to_string(), "no available frontend port on load balancer foo-public-lb");
    }

    #[test]
    fn test_existing_rule() {
        let existing = rule("foo-control-plane-abcde", 22);
        assert!(spec(Vec::new()).parameters(Some(&existing)).unwrap().is_none());
        assert_eq!(spec(Vec::new()).owner_resource_name(), "foo-public-lb");
    }
}
