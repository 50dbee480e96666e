//! v1alpha4 <-> v1beta1 conversion
//!
//! Hub-only fields restored from the annotation on up-conversion:
//! cloud provider overrides, vnet peerings, public IP tags (frontend IPs
//! matched by name, NAT gateways by subnet name, bastion), the purchase
//! plan of shared gallery images, additional capabilities and template
//! metadata.

use tracing::{debug, trace};

use super::azure_cluster::{AzureCluster, AzureClusterSpec};
use super::azure_cluster_identity::{AzureClusterIdentity, AzureClusterIdentitySpec};
use super::azure_machine::{AzureMachine, AzureMachineSpec, AzureSharedGalleryImage, Image};
use super::azure_machine_template::{
    AzureMachineTemplate, AzureMachineTemplateResource, AzureMachineTemplateSpec,
};
use super::types::{
    AzureBastion, BastionSpec, FrontendIP, LoadBalancerSpec, NatGateway, NetworkSpec, PublicIPSpec,
    SubnetSpec, VnetSpec,
};
use crate::conversion::{Convertible, find_by_name, hub_metadata, spoke_metadata, unmarshal_data};
use crate::error::ApiError;
use crate::v1beta1;

impl Convertible<v1beta1::AzureCluster> for AzureCluster {
    fn convert_to(&self) -> Result<v1beta1::AzureCluster, ApiError> {
        let mut hub = v1beta1::AzureCluster {
            metadata: hub_metadata(&self.metadata),
            spec: (&self.spec).into(),
            status: self.status.clone(),
        };
        if let Some(restored) = unmarshal_data::<v1beta1::AzureCluster>(&self.metadata)? {
            debug!("Restoring AzureCluster fields from hub annotation");
            restore_cluster_spec(&mut hub.spec, &restored.spec);
        }
        Ok(hub)
    }

    fn convert_from(hub: &v1beta1::AzureCluster) -> Result<Self, ApiError> {
        Ok(AzureCluster {
            metadata: spoke_metadata(hub)?,
            spec: (&hub.spec).into(),
            status: hub.status.clone(),
        })
    }
}

impl Convertible<v1beta1::AzureMachine> for AzureMachine {
    fn convert_to(&self) -> Result<v1beta1::AzureMachine, ApiError> {
        let mut hub = v1beta1::AzureMachine {
            metadata: hub_metadata(&self.metadata),
            spec: (&self.spec).into(),
            status: self.status.clone(),
        };
        if let Some(restored) = unmarshal_data::<v1beta1::AzureMachine>(&self.metadata)? {
            debug!("Restoring AzureMachine fields from hub annotation");
            restore_machine_spec(&mut hub.spec, &restored.spec);
        }
        Ok(hub)
    }

    fn convert_from(hub: &v1beta1::AzureMachine) -> Result<Self, ApiError> {
        Ok(AzureMachine {
            metadata: spoke_metadata(hub)?,
            spec: (&hub.spec).into(),
            status: hub.status.clone(),
        })
    }
}

impl Convertible<v1beta1::AzureMachineTemplate> for AzureMachineTemplate {
    fn convert_to(&self) -> Result<v1beta1::AzureMachineTemplate, ApiError> {
        let mut hub = v1beta1::AzureMachineTemplate {
            metadata: hub_metadata(&self.metadata),
            spec: v1beta1::AzureMachineTemplateSpec {
                template: v1beta1::AzureMachineTemplateResource {
                    metadata: Default::default(),
                    spec: (&self.spec.template.spec).into(),
                },
            },
        };
        if let Some(restored) = unmarshal_data::<v1beta1::AzureMachineTemplate>(&self.metadata)? {
            debug!("Restoring AzureMachineTemplate fields from hub annotation");
            hub.spec.template.metadata = restored.spec.template.metadata.clone();
            restore_machine_spec(&mut hub.spec.template.spec, &restored.spec.template.spec);
        }
        Ok(hub)
    }

    fn convert_from(hub: &v1beta1::AzureMachineTemplate) -> Result<Self, ApiError> {
        Ok(AzureMachineTemplate {
            metadata: spoke_metadata(hub)?,
            spec: AzureMachineTemplateSpec {
                template: AzureMachineTemplateResource {
                    spec: (&hub.spec.template.spec).into(),
                },
            },
        })
    }
}

impl Convertible<v1beta1::AzureClusterIdentity> for AzureClusterIdentity {
    fn convert_to(&self) -> Result<v1beta1::AzureClusterIdentity, ApiError> {
        let spec = &self.spec;
        Ok(v1beta1::AzureClusterIdentity {
            metadata: hub_metadata(&self.metadata),
            spec: v1beta1::AzureClusterIdentitySpec {
                type_: spec.type_,
                resource_id: spec.resource_id.clone(),
                client_id: spec.client_id.clone(),
                client_secret: spec.client_secret.clone(),
                tenant_id: spec.tenant_id.clone(),
                allowed_namespaces: spec.allowed_namespaces.clone(),
            },
            status: self.status.clone(),
        })
    }

    fn convert_from(hub: &v1beta1::AzureClusterIdentity) -> Result<Self, ApiError> {
        let spec = &hub.spec;
        Ok(AzureClusterIdentity {
            metadata: spoke_metadata(hub)?,
            spec: AzureClusterIdentitySpec {
                type_: spec.type_,
                resource_id: spec.resource_id.clone(),
                client_id: spec.client_id.clone(),
                client_secret: spec.client_secret.clone(),
                tenant_id: spec.tenant_id.clone(),
                allowed_namespaces: spec.allowed_namespaces.clone(),
            },
            status: hub.status.clone(),
        })
    }
}

/// Copies the cluster fields v1alpha4 drops from `restored` into `spec`.
pub(crate) fn restore_cluster_spec(
    spec: &mut v1beta1::AzureClusterSpec,
    restored: &v1beta1::AzureClusterSpec,
) {
    spec.cloud_provider_config_overrides = restored.cloud_provider_config_overrides.clone();

    let network = &mut spec.network_spec;
    let previous = &restored.network_spec;
    network.vnet.peerings = previous.vnet.peerings.clone();

    restore_frontend_ip_tags(&mut network.api_server_lb, &previous.api_server_lb);
    if let (Some(lb), Some(prev)) = (
        network.node_outbound_lb.as_mut(),
        previous.node_outbound_lb.as_ref(),
    ) {
        restore_frontend_ip_tags(lb, prev);
    }
    if let (Some(lb), Some(prev)) = (
        network.control_plane_outbound_lb.as_mut(),
        previous.control_plane_outbound_lb.as_ref(),
    ) {
        restore_frontend_ip_tags(lb, prev);
    }

    for subnet in &mut network.subnets {
        match find_by_name(&previous.subnets, &subnet.name, |s| s.name.as_str()) {
            Some(prev) => {
                subnet.nat_gateway.nat_gateway_ip.ip_tags =
                    prev.nat_gateway.nat_gateway_ip.ip_tags.clone();
            }
            None => trace!("No preserved subnet named {}", subnet.name),
        }
    }

    if let (Some(bastion), Some(prev)) = (
        spec.bastion_spec.azure_bastion.as_mut(),
        restored.bastion_spec.azure_bastion.as_ref(),
    ) {
        bastion.public_ip.ip_tags = prev.public_ip.ip_tags.clone();
        // Tags of a renamed NAT gateway are dropped.
        if bastion.subnet.nat_gateway.name == prev.subnet.nat_gateway.name {
            bastion.subnet.nat_gateway.nat_gateway_ip.ip_tags =
                prev.subnet.nat_gateway.nat_gateway_ip.ip_tags.clone();
        } else {
            trace!(
                "Bastion NAT gateway renamed from {} to {}",
                prev.subnet.nat_gateway.name, bastion.subnet.nat_gateway.name
            );
        }
    }
}

/// Restores public IP tags of frontend IPs matched by name.
pub(crate) fn restore_frontend_ip_tags(
    lb: &mut v1beta1::LoadBalancerSpec,
    previous: &v1beta1::LoadBalancerSpec,
) {
    for frontend in &mut lb.frontend_ips {
        let Some(public_ip) = frontend.public_ip.as_mut() else {
            continue;
        };
        let preserved = find_by_name(&previous.frontend_ips, &frontend.name, |f| f.name.as_str())
            .and_then(|f| f.public_ip.as_ref());
        match preserved {
            Some(prev) => public_ip.ip_tags = prev.ip_tags.clone(),
            None => trace!("No preserved frontend IP named {}", frontend.name),
        }
    }
}

/// Copies the machine fields v1alpha4 drops from `restored` into `spec`.
pub(crate) fn restore_machine_spec(
    spec: &mut v1beta1::AzureMachineSpec,
    restored: &v1beta1::AzureMachineSpec,
) {
    spec.additional_capabilities = restored.additional_capabilities.clone();

    let gallery = spec.image.as_mut().and_then(|i| i.shared_gallery.as_mut());
    let previous = restored.image.as_ref().and_then(|i| i.shared_gallery.as_ref());
    if let (Some(gallery), Some(previous)) = (gallery, previous) {
        gallery.publisher = previous.publisher.clone();
        gallery.offer = previous.offer.clone();
        gallery.sku = previous.sku.clone();
    }
}

impl From<&v1beta1::AzureClusterSpec> for AzureClusterSpec {
    fn from(hub: &v1beta1::AzureClusterSpec) -> Self {
        AzureClusterSpec {
            subscription_id: hub.subscription_id.clone(),
            location: hub.location.clone(),
            additional_tags: hub.additional_tags.clone(),
            identity_ref: hub.identity_ref.clone(),
            azure_environment: hub.azure_environment.clone(),
            network_spec: (&hub.network_spec).into(),
            resource_group: hub.resource_group.clone(),
            bastion_spec: (&hub.bastion_spec).into(),
            control_plane_endpoint: hub.control_plane_endpoint.clone(),
        }
    }
}

impl From<&AzureClusterSpec> for v1beta1::AzureClusterSpec {
    fn from(spoke: &AzureClusterSpec) -> Self {
        v1beta1::AzureClusterSpec {
            subscription_id: spoke.subscription_id.clone(),
            location: spoke.location.clone(),
            additional_tags: spoke.additional_tags.clone(),
            identity_ref: spoke.identity_ref.clone(),
            azure_environment: spoke.azure_environment.clone(),
            cloud_provider_config_overrides: None,
            network_spec: (&spoke.network_spec).into(),
            resource_group: spoke.resource_group.clone(),
            bastion_spec: (&spoke.bastion_spec).into(),
            control_plane_endpoint: spoke.control_plane_endpoint.clone(),
        }
    }
}

impl From<&v1beta1::NetworkSpec> for NetworkSpec {
    fn from(hub: &v1beta1::NetworkSpec) -> Self {
        NetworkSpec {
            vnet: (&hub.vnet).into(),
            subnets: hub.subnets.iter().map(Into::into).collect(),
            api_server_lb: (&hub.api_server_lb).into(),
            node_outbound_lb: hub.node_outbound_lb.as_ref().map(Into::into),
            control_plane_outbound_lb: hub.control_plane_outbound_lb.as_ref().map(Into::into),
            private_dns_zone_name: hub.private_dns_zone_name.clone(),
        }
    }
}

impl From<&NetworkSpec> for v1beta1::NetworkSpec {
    fn from(spoke: &NetworkSpec) -> Self {
        v1beta1::NetworkSpec {
            vnet: (&spoke.vnet).into(),
            subnets: spoke.subnets.iter().map(Into::into).collect(),
            api_server_lb: (&spoke.api_server_lb).into(),
            node_outbound_lb: spoke.node_outbound_lb.as_ref().map(Into::into),
            control_plane_outbound_lb: spoke.control_plane_outbound_lb.as_ref().map(Into::into),
            private_dns_zone_name: spoke.private_dns_zone_name.clone(),
        }
    }
}

impl From<&v1beta1::VnetSpec> for VnetSpec {
    fn from(hub: &v1beta1::VnetSpec) -> Self {
        VnetSpec {
            resource_group: hub.resource_group.clone(),
            id: hub.id.clone(),
            name: hub.name.clone(),
            cidr_blocks: hub.cidr_blocks.clone(),
            tags: hub.tags.clone(),
        }
    }
}

impl From<&VnetSpec> for v1beta1::VnetSpec {
    fn from(spoke: &VnetSpec) -> Self {
        v1beta1::VnetSpec {
            resource_group: spoke.resource_group.clone(),
            id: spoke.id.clone(),
            name: spoke.name.clone(),
            cidr_blocks: spoke.cidr_blocks.clone(),
            tags: spoke.tags.clone(),
            peerings: Vec::new(),
        }
    }
}

impl From<&v1beta1::SubnetSpec> for SubnetSpec {
    fn from(hub: &v1beta1::SubnetSpec) -> Self {
        SubnetSpec {
            role: hub.role,
            cidr_blocks: hub.cidr_blocks.clone(),
            id: hub.id.clone(),
            name: hub.name.clone(),
            security_group: hub.security_group.clone(),
            route_table: hub.route_table.clone(),
            nat_gateway: (&hub.nat_gateway).into(),
        }
    }
}

impl From<&SubnetSpec> for v1beta1::SubnetSpec {
    fn from(spoke: &SubnetSpec) -> Self {
        v1beta1::SubnetSpec {
            role: spoke.role,
            cidr_blocks: spoke.cidr_blocks.clone(),
            id: spoke.id.clone(),
            name: spoke.name.clone(),
            security_group: spoke.security_group.clone(),
            route_table: spoke.route_table.clone(),
            nat_gateway: (&spoke.nat_gateway).into(),
        }
    }
}

impl From<&v1beta1::NatGateway> for NatGateway {
    fn from(hub: &v1beta1::NatGateway) -> Self {
        NatGateway {
            id: hub.id.clone(),
            name: hub.name.clone(),
            nat_gateway_ip: (&hub.nat_gateway_ip).into(),
        }
    }
}

impl From<&NatGateway> for v1beta1::NatGateway {
    fn from(spoke: &NatGateway) -> Self {
        v1beta1::NatGateway {
            id: spoke.id.clone(),
            name: spoke.name.clone(),
            nat_gateway_ip: (&spoke.nat_gateway_ip).into(),
        }
    }
}

impl From<&v1beta1::PublicIPSpec> for PublicIPSpec {
    fn from(hub: &v1beta1::PublicIPSpec) -> Self {
        PublicIPSpec {
            name: hub.name.clone(),
            dns_name: hub.dns_name.clone(),
        }
    }
}

impl From<&PublicIPSpec> for v1beta1::PublicIPSpec {
    fn from(spoke: &PublicIPSpec) -> Self {
        v1beta1::PublicIPSpec {
            name: spoke.name.clone(),
            dns_name: spoke.dns_name.clone(),
            ip_tags: Vec::new(),
        }
    }
}

impl From<&v1beta1::LoadBalancerSpec> for LoadBalancerSpec {
    fn from(hub: &v1beta1::LoadBalancerSpec) -> Self {
        LoadBalancerSpec {
            id: hub.id.clone(),
            name: hub.name.clone(),
            frontend_ips: hub.frontend_ips.iter().map(Into::into).collect(),
            frontend_ips_count: hub.frontend_ips_count,
            sku: hub.sku.clone(),
            type_: hub.type_.clone(),
            idle_timeout_in_minutes: hub.idle_timeout_in_minutes,
        }
    }
}

impl From<&LoadBalancerSpec> for v1beta1::LoadBalancerSpec {
    fn from(spoke: &LoadBalancerSpec) -> Self {
        v1beta1::LoadBalancerSpec {
            id: spoke.id.clone(),
            name: spoke.name.clone(),
            frontend_ips: spoke.frontend_ips.iter().map(Into::into).collect(),
            frontend_ips_count: spoke.frontend_ips_count,
            sku: spoke.sku.clone(),
            type_: spoke.type_.clone(),
            idle_timeout_in_minutes: spoke.idle_timeout_in_minutes,
        }
    }
}

impl From<&v1beta1::FrontendIP> for FrontendIP {
    fn from(hub: &v1beta1::FrontendIP) -> Self {
        FrontendIP {
            name: hub.name.clone(),
            private_ip_address: hub.private_ip_address.clone(),
            public_ip: hub.public_ip.as_ref().map(Into::into),
        }
    }
}

impl From<&FrontendIP> for v1beta1::FrontendIP {
    fn from(spoke: &FrontendIP) -> Self {
        v1beta1::FrontendIP {
            name: spoke.name.clone(),
            private_ip_address: spoke.private_ip_address.clone(),
            public_ip: spoke.public_ip.as_ref().map(Into::into),
        }
    }
}

impl From<&v1beta1::BastionSpec> for BastionSpec {
    fn from(hub: &v1beta1::BastionSpec) -> Self {
        BastionSpec {
            azure_bastion: hub.azure_bastion.as_ref().map(|b| AzureBastion {
                name: b.name.clone(),
                subnet: (&b.subnet).into(),
                public_ip: (&b.public_ip).into(),
            }),
        }
    }
}

impl From<&BastionSpec> for v1beta1::BastionSpec {
    fn from(spoke: &BastionSpec) -> Self {
        v1beta1::BastionSpec {
            azure_bastion: spoke.azure_bastion.as_ref().map(|b| v1beta1::AzureBastion {
                name: b.name.clone(),
                subnet: (&b.subnet).into(),
                public_ip: (&b.public_ip).into(),
            }),
        }
    }
}

impl From<&v1beta1::AzureMachineSpec> for AzureMachineSpec {
    fn from(hub: &v1beta1::AzureMachineSpec) -> Self {
        AzureMachineSpec {
            provider_id: hub.provider_id.clone(),
            vm_size: hub.vm_size.clone(),
            failure_domain: hub.failure_domain.clone(),
            image: hub.image.as_ref().map(Into::into),
            identity: hub.identity,
            user_assigned_identities: hub.user_assigned_identities.clone(),
            role_assignment_name: hub.role_assignment_name.clone(),
            os_disk: hub.os_disk.clone(),
            data_disks: hub.data_disks.clone(),
            ssh_public_key: hub.ssh_public_key.clone(),
            additional_tags: hub.additional_tags.clone(),
            allocate_public_ip: hub.allocate_public_ip,
            enable_ip_forwarding: hub.enable_ip_forwarding,
            accelerated_networking: hub.accelerated_networking,
            spot_vm_options: hub.spot_vm_options.clone(),
            security_profile: hub.security_profile.clone(),
            subnet_name: hub.subnet_name.clone(),
        }
    }
}

impl From<&AzureMachineSpec> for v1beta1::AzureMachineSpec {
    fn from(spoke: &AzureMachineSpec) -> Self {
        v1beta1::AzureMachineSpec {
            provider_id: spoke.provider_id.clone(),
            vm_size: spoke.vm_size.clone(),
            failure_domain: spoke.failure_domain.clone(),
            image: spoke.image.as_ref().map(Into::into),
            identity: spoke.identity,
            user_assigned_identities: spoke.user_assigned_identities.clone(),
            role_assignment_name: spoke.role_assignment_name.clone(),
            os_disk: spoke.os_disk.clone(),
            data_disks: spoke.data_disks.clone(),
            ssh_public_key: spoke.ssh_public_key.clone(),
            additional_tags: spoke.additional_tags.clone(),
            additional_capabilities: None,
            allocate_public_ip: spoke.allocate_public_ip,
            enable_ip_forwarding: spoke.enable_ip_forwarding,
            accelerated_networking: spoke.accelerated_networking,
            spot_vm_options: spoke.spot_vm_options.clone(),
            security_profile: spoke.security_profile.clone(),
            subnet_name: spoke.subnet_name.clone(),
        }
    }
}

impl From<&v1beta1::Image> for Image {
    fn from(hub: &v1beta1::Image) -> Self {
        Image {
            id: hub.id.clone(),
            shared_gallery: hub.shared_gallery.as_ref().map(|g| AzureSharedGalleryImage {
                subscription_id: g.subscription_id.clone(),
                resource_group: g.resource_group.clone(),
                gallery: g.gallery.clone(),
                name: g.name.clone(),
                version: g.version.clone(),
            }),
            marketplace: hub.marketplace.clone(),
        }
    }
}

impl From<&Image> for v1beta1::Image {
    fn from(spoke: &Image) -> Self {
        v1beta1::Image {
            id: spoke.id.clone(),
            shared_gallery: spoke
                .shared_gallery
                .as_ref()
                .map(|g| v1beta1::AzureSharedGalleryImage {
                    subscription_id: g.subscription_id.clone(),
                    resource_group: g.resource_group.clone(),
                    gallery: g.gallery.clone(),
                    name: g.name.clone(),
                    version: g.version.clone(),
                    publisher: None,
                    offer: None,
                    sku: None,
                }),
            marketplace: spoke.marketplace.clone(),
        }
    }
}
