//! Public IP address spec

use std::any::Any;

use azure_crds::v1beta1::{self, SKU_STANDARD, Tags};

use super::owned_tags;
use crate::error::SpecError;
use crate::models::{DnsSettings, IpTag, PublicIPAddress, PublicIPAddressProperties, Sku};
use crate::spec_trait::{ResourceSpecGetter, existing_as};

/// Desired state of a static public IP
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicIPSpec {
    /// Public IP name
    pub name: String,
    /// Cluster resource group
    pub resource_group: String,
    /// Azure region
    pub location: String,
    /// FQDN; its first label becomes the domain name label
    pub dns_name: String,
    /// IPv6 instead of IPv4
    pub is_ipv6: bool,
    /// Azure IP tags
    pub ip_tags: Vec<v1beta1::IPTag>,
    /// Availability zones
    pub zones: Vec<String>,
    /// Owning cluster, used for the ownership tag
    pub cluster_name: String,
    /// Extra tags merged with the ownership tags
    pub additional_tags: Tags,
}

impl ResourceSpecGetter for PublicIPSpec {
    type Parameters = PublicIPAddress;

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    fn parameters(&self, existing: Option<&dyn Any>) -> Result<Option<PublicIPAddress>, SpecError> {
        if existing_as::<PublicIPAddress>(existing)?.is_some() {
            return Ok(None);
        }

        let dns_settings = (!self.dns_name.is_empty()).then(|| DnsSettings {
            domain_name_label: self.dns_name.split('.').next().unwrap_or_default().to_string(),
            fqdn: self.dns_name.clone(),
        });
        Ok(Some(PublicIPAddress {
            location: self.location.clone(),
            tags: owned_tags(&self.cluster_name, &self.name, None, &self.additional_tags),
            sku: Sku::new(SKU_STANDARD),
            zones: self.zones.clone(),
            properties: PublicIPAddressProperties {
                public_ip_address_version: if self.is_ipv6 { "IPv6" } else { "IPv4" }.to_string(),
                public_ip_allocation_method: "Static".to_string(),
                dns_settings,
                ip_tags: self
                    .ip_tags
                    .iter()
                    .map(|t| IpTag {
                        ip_tag_type: t.type_.clone(),
                        tag: t.tag.clone(),
                    })
                    .collect(),
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn spec() -> PublicIPSpec {
        PublicIPSpec {
            name: "pip-foo-apiserver".to_string(),
            resource_group: "foo".to_string(),
            location: "eastus".to_string(),
            dns_name: "foo-1a2b3c.eastus.cloudapp.azure.com".to_string(),
            ip_tags: vec![v1beta1::IPTag {
                type_: "FirstPartyUsage".to_string(),
                tag: "/NonProd".to_string(),
            }],
            cluster_name: "foo".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_public_ip_body() {
        let ip = spec().parameters(None).unwrap().unwrap();
        let value = serde_json::to_value(&ip).unwrap();
        assert_eq!(
            value["properties"],
            json!({
                "publicIPAddressVersion": "IPv4",
                "publicIPAllocationMethod": "Static",
                "dnsSettings": {
                    "domainNameLabel": "foo-1a2b3c",
                    "fqdn": "foo-1a2b3c.eastus.cloudapp.azure.com"
                },
                "ipTags": [{"ipTagType": "FirstPartyUsage", "tag": "/NonProd"}]
            })
        );
        assert_eq!(value["sku"], json!({"name": "Standard"}));
        assert!(value.get("zones").is_none());
    }

    #[test]
    fn test_ipv6_without_dns() {
        let mut spec = spec();
        spec.is_ipv6 = true;
        spec.dns_name.clear();
        spec.zones = vec!["1".to_string(), "2".to_string()];
        let ip = spec.parameters(None).unwrap().unwrap();
        assert_eq!(ip.properties.public_ip_address_version, "IPv6");
        assert!(ip.properties.dns_settings.is_none());
        assert_eq!(ip.zones, vec!["1", "2"]);
    }

    #[test]
    fn test_existing_public_ip() {
        let existing = PublicIPAddress::default();
        assert!(spec().parameters(Some(&existing)).unwrap().is_none());
    }
}
