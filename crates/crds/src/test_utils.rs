//! Test utilities for unit testing defaulting, validation and conversion
//!
//! This module provides helpers for creating test objects.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::v1beta1::*;
use crate::webhook::Defaulter;

/// Valid base64-encoded OpenSSH RSA public key.
pub const TEST_SSH_PUBLIC_KEY: &str = "c3NoLXJzYSBBQUFBQjNOemFDMXljMkVBQUFBREFRQUJBQUFCQVFDOHR6YWs4V0Z1SWI0QTNrRVVzUm84Q0NEa1NyYVNNM0FhVGloSDZYZmtDSmpGRnJJWjQ1NHBJMW5aNmQwNE1BWGRsR2hGaTN0S01jWXVtTnk0M29OMEpFM1g0ZW14MmJLcTVvYml5QUFZWFhwMG9LbldaUlRMb0p3SFR1OFhKRWZuQ3NFdTVEb3pDR0JwbjBsL1g1czRYR0wvRm5HampkMkovSUVNMDlxQThwZUJpSHE5SDBJeXhpbFcvY1VCVDA1cmY1VGtDZHdkK3NsejFNMmxObklGcU9rd0hBSjJuTjRoRkFINVBVdHVyaEZhaDB1SUZ3L1BHdXY0M3BreDRMSEhtVWxJYlRxMDlqZ1VsQzJ3cVloZ0J4ZERTVWtTdGlpL0FISWhTbDliWlVjMUFzNDN1bjNLVzhRazJ1aDhidUdTeHJqZi9LaXYwOWlPVnJoVE95Sk4gbm9ib2R5QGV4YW1wbGUuY29tCg==";

/// Helper to create a test AzureCluster with only name and location set
pub fn create_test_cluster(name: &str) -> AzureCluster {
    AzureCluster {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        },
        spec: AzureClusterSpec {
            location: "eastus".to_string(),
            ..Default::default()
        },
        status: None,
    }
}

/// Helper to create a defaulted test AzureCluster
pub fn create_defaulted_cluster(name: &str) -> AzureCluster {
    let mut cluster = create_test_cluster(name);
    cluster.set_defaults().unwrap();
    cluster
}

/// Helper to create a valid test AzureMachine using a marketplace image
pub fn create_test_machine(name: &str) -> AzureMachine {
    AzureMachine {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        },
        spec: AzureMachineSpec {
            vm_size: "Standard_D2s_v3".to_string(),
            image: Some(Image {
                marketplace: Some(AzureMarketplaceImage {
                    publisher: "cncf-upstream".to_string(),
                    offer: "capi".to_string(),
                    sku: "k8s-1dot25dot6-ubuntu-2004".to_string(),
                    version: "latest".to_string(),
                    third_party_image: false,
                }),
                ..Default::default()
            }),
            os_disk: OSDisk {
                os_type: OS_TYPE_LINUX.to_string(),
                disk_size_gb: Some(128),
                managed_disk: Some(ManagedDiskParameters {
                    storage_account_type: "Premium_LRS".to_string(),
                    disk_encryption_set: None,
                }),
                ..Default::default()
            },
            ssh_public_key: TEST_SSH_PUBLIC_KEY.to_string(),
            ..Default::default()
        },
        status: None,
    }
}

/// Helper to create a test AzureMachineTemplate wrapping `create_test_machine`
pub fn create_test_machine_template(name: &str) -> AzureMachineTemplate {
    AzureMachineTemplate {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        },
        spec: AzureMachineTemplateSpec {
            template: AzureMachineTemplateResource {
                metadata: crate::capi::ObjectMeta::default(),
                spec: create_test_machine(name).spec,
            },
        },
    }
}

/// Helper to create a test AzureClusterIdentity
pub fn create_test_identity(name: &str, type_: IdentityType) -> AzureClusterIdentity {
    AzureClusterIdentity {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        },
        spec: AzureClusterIdentitySpec {
            type_,
            client_id: "fake-client-id".to_string(),
            tenant_id: "fake-tenant-id".to_string(),
            ..Default::default()
        },
        status: None,
    }
}
