//! v1alpha3 <-> v1beta1 conversion
//!
//! On top of what v1alpha4 drops, v1alpha3 has no outbound load balancers,
//! private DNS zone, NAT gateways, bastion, load balancer frontend count
//! and idle timeout, machine security profile or data disk caching. All of
//! them come back from the hub annotation; subnets are matched by name and
//! data disks by `nameSuffix`.
//!
//! Subnet roles `cluster` and `bastion` have no v1alpha3 counterpart, and
//! `ManualServicePrincipal` identities have no hub counterpart; both fail
//! with a shape mismatch.

use tracing::{debug, trace};

use super::azure_cluster::{AzureCluster, AzureClusterSpec};
use super::azure_cluster_identity::{AzureClusterIdentity, AzureClusterIdentitySpec, IdentityType};
use super::azure_machine::{AzureMachine, AzureMachineSpec, DataDisk};
use super::azure_machine_template::{
    AzureMachineTemplate, AzureMachineTemplateResource, AzureMachineTemplateSpec,
};
use super::types::{LoadBalancerSpec, NetworkSpec, SubnetRole, SubnetSpec};
use super::VERSION;
use crate::conversion::{
    Convertible, find_by_name, hub_metadata, shape_mismatch, spoke_metadata, unmarshal_data,
};
use crate::error::ApiError;
use crate::v1alpha4::conversion as v1alpha4_conversion;
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
            spec: AzureClusterSpec::try_from(&hub.spec)?,
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
        let type_ = match spec.type_ {
            IdentityType::ServicePrincipal => v1beta1::IdentityType::ServicePrincipal,
            IdentityType::UserAssignedMSI => v1beta1::IdentityType::UserAssignedMSI,
            IdentityType::ManualServicePrincipal => {
                return Err(shape_mismatch(
                    "spec.type",
                    "ManualServicePrincipal",
                    v1beta1::VERSION,
                ));
            }
        };
        Ok(v1beta1::AzureClusterIdentity {
            metadata: hub_metadata(&self.metadata),
            spec: v1beta1::AzureClusterIdentitySpec {
                type_,
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
        let type_ = match spec.type_ {
            v1beta1::IdentityType::ServicePrincipal => IdentityType::ServicePrincipal,
            v1beta1::IdentityType::UserAssignedMSI => IdentityType::UserAssignedMSI,
        };
        Ok(AzureClusterIdentity {
            metadata: spoke_metadata(hub)?,
            spec: AzureClusterIdentitySpec {
                type_,
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

/// Copies the cluster fields v1alpha3 drops from `restored` into `spec`.
fn restore_cluster_spec(spec: &mut v1beta1::AzureClusterSpec, restored: &v1beta1::AzureClusterSpec) {
    let network = &mut spec.network_spec;
    let previous = &restored.network_spec;
    network.node_outbound_lb = previous.node_outbound_lb.clone();
    network.control_plane_outbound_lb = previous.control_plane_outbound_lb.clone();
    network.private_dns_zone_name = previous.private_dns_zone_name.clone();
    network.api_server_lb.frontend_ips_count = previous.api_server_lb.frontend_ips_count;
    network.api_server_lb.idle_timeout_in_minutes = previous.api_server_lb.idle_timeout_in_minutes;

    for subnet in &mut network.subnets {
        match find_by_name(&previous.subnets, &subnet.name, |s| s.name.as_str()) {
            Some(prev) => subnet.nat_gateway = prev.nat_gateway.clone(),
            None => trace!("No preserved subnet named {}", subnet.name),
        }
    }

    spec.bastion_spec = restored.bastion_spec.clone();

    v1alpha4_conversion::restore_cluster_spec(spec, restored);
}

/// Copies the machine fields v1alpha3 drops from `restored` into `spec`.
fn restore_machine_spec(spec: &mut v1beta1::AzureMachineSpec, restored: &v1beta1::AzureMachineSpec) {
    spec.security_profile = restored.security_profile.clone();

    for disk in &mut spec.data_disks {
        match find_by_name(&restored.data_disks, &disk.name_suffix, |d| d.name_suffix.as_str()) {
            Some(prev) => disk.caching_type = prev.caching_type.clone(),
            None => trace!("No preserved data disk with suffix {}", disk.name_suffix),
        }
    }

    v1alpha4_conversion::restore_machine_spec(spec, restored);
}

impl TryFrom<&v1beta1::AzureClusterSpec> for AzureClusterSpec {
    type Error = ApiError;

    fn try_from(hub: &v1beta1::AzureClusterSpec) -> Result<Self, Self::Error> {
        Ok(AzureClusterSpec {
            subscription_id: hub.subscription_id.clone(),
            location: hub.location.clone(),
            additional_tags: hub.additional_tags.clone(),
            identity_ref: hub.identity_ref.clone(),
            azure_environment: hub.azure_environment.clone(),
            network_spec: NetworkSpec::try_from(&hub.network_spec)?,
            resource_group: hub.resource_group.clone(),
            control_plane_endpoint: hub.control_plane_endpoint.clone(),
        })
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
            bastion_spec: v1beta1::BastionSpec::default(),
            control_plane_endpoint: spoke.control_plane_endpoint.clone(),
        }
    }
}

impl TryFrom<&v1beta1::NetworkSpec> for NetworkSpec {
    type Error = ApiError;

    fn try_from(hub: &v1beta1::NetworkSpec) -> Result<Self, Self::Error> {
        Ok(NetworkSpec {
            vnet: (&hub.vnet).into(),
            subnets: hub
                .subnets
                .iter()
                .map(SubnetSpec::try_from)
                .collect::<Result<_, _>>()?,
            api_server_lb: (&hub.api_server_lb).into(),
        })
    }
}

impl From<&NetworkSpec> for v1beta1::NetworkSpec {
    fn from(spoke: &NetworkSpec) -> Self {
        v1beta1::NetworkSpec {
            vnet: (&spoke.vnet).into(),
            subnets: spoke.subnets.iter().map(Into::into).collect(),
            api_server_lb: (&spoke.api_server_lb).into(),
            node_outbound_lb: None,
            control_plane_outbound_lb: None,
            private_dns_zone_name: String::new(),
        }
    }
}

impl TryFrom<&v1beta1::SubnetSpec> for SubnetSpec {
    type Error = ApiError;

    fn try_from(hub: &v1beta1::SubnetSpec) -> Result<Self, Self::Error> {
        let role = match hub.role {
            None => None,
            Some(v1beta1::SubnetRole::ControlPlane) => Some(SubnetRole::ControlPlane),
            Some(v1beta1::SubnetRole::Node) => Some(SubnetRole::Node),
            Some(other @ (v1beta1::SubnetRole::Cluster | v1beta1::SubnetRole::Bastion)) => {
                return Err(shape_mismatch(
                    "spec.networkSpec.subnets.role",
                    other.as_str(),
                    VERSION,
                ));
            }
        };
        Ok(SubnetSpec {
            role,
            cidr_blocks: hub.cidr_blocks.clone(),
            id: hub.id.clone(),
            name: hub.name.clone(),
            security_group: hub.security_group.clone(),
            route_table: hub.route_table.clone(),
        })
    }
}

impl From<&SubnetSpec> for v1beta1::SubnetSpec {
    fn from(spoke: &SubnetSpec) -> Self {
        v1beta1::SubnetSpec {
            role: spoke.role.map(|role| match role {
                SubnetRole::ControlPlane => v1beta1::SubnetRole::ControlPlane,
                SubnetRole::Node => v1beta1::SubnetRole::Node,
            }),
            cidr_blocks: spoke.cidr_blocks.clone(),
            id: spoke.id.clone(),
            name: spoke.name.clone(),
            security_group: spoke.security_group.clone(),
            route_table: spoke.route_table.clone(),
            nat_gateway: v1beta1::NatGateway::default(),
        }
    }
}

impl From<&v1beta1::LoadBalancerSpec> for LoadBalancerSpec {
    fn from(hub: &v1beta1::LoadBalancerSpec) -> Self {
        LoadBalancerSpec {
            id: hub.id.clone(),
            name: hub.name.clone(),
            sku: hub.sku.clone(),
            type_: hub.type_.clone(),
            frontend_ips: hub.frontend_ips.iter().map(Into::into).collect(),
        }
    }
}

impl From<&LoadBalancerSpec> for v1beta1::LoadBalancerSpec {
    fn from(spoke: &LoadBalancerSpec) -> Self {
        v1beta1::LoadBalancerSpec {
            id: spoke.id.clone(),
            name: spoke.name.clone(),
            frontend_ips: spoke.frontend_ips.iter().map(Into::into).collect(),
            frontend_ips_count: None,
            sku: spoke.sku.clone(),
            type_: spoke.type_.clone(),
            idle_timeout_in_minutes: None,
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
            data_disks: hub.data_disks.iter().map(Into::into).collect(),
            ssh_public_key: hub.ssh_public_key.clone(),
            additional_tags: hub.additional_tags.clone(),
            allocate_public_ip: hub.allocate_public_ip,
            enable_ip_forwarding: hub.enable_ip_forwarding,
            accelerated_networking: hub.accelerated_networking,
            spot_vm_options: hub.spot_vm_options.clone(),
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
            data_disks: spoke.data_disks.iter().map(Into::into).collect(),
            ssh_public_key: spoke.ssh_public_key.clone(),
            additional_tags: spoke.additional_tags.clone(),
            additional_capabilities: None,
            allocate_public_ip: spoke.allocate_public_ip,
            enable_ip_forwarding: spoke.enable_ip_forwarding,
            accelerated_networking: spoke.accelerated_networking,
            spot_vm_options: spoke.spot_vm_options.clone(),
            security_profile: None,
            subnet_name: spoke.subnet_name.clone(),
        }
    }
}

impl From<&v1beta1::DataDisk> for DataDisk {
    fn from(hub: &v1beta1::DataDisk) -> Self {
        DataDisk {
            name_suffix: hub.name_suffix.clone(),
            disk_size_gb: hub.disk_size_gb,
            managed_disk: hub.managed_disk.clone(),
            lun: hub.lun,
        }
    }
}

impl From<&DataDisk> for v1beta1::DataDisk {
    fn from(spoke: &DataDisk) -> Self {
        v1beta1::DataDisk {
            name_suffix: spoke.name_suffix.clone(),
            disk_size_gb: spoke.disk_size_gb,
            managed_disk: spoke.managed_disk.clone(),
            lun: spoke.lun,
            caching_type: String::new(),
        }
    }
}
