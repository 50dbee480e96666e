//! Names of resources owned by a single machine or node group

/// `<vm>-nic`
pub fn network_interface_name(vm: &str) -> String {
    format!("{vm}-nic")
}

/// `<vm>_OSDisk`
pub fn os_disk_name(vm: &str) -> String {
    format!("{vm}_OSDisk")
}

/// `<vm>_<suffix>`
pub fn data_disk_name(vm: &str, suffix: &str) -> String {
    format!("{vm}_{suffix}")
}

/// `pip-<vm>`
pub fn node_public_ip_name(vm: &str) -> String {
    format!("pip-{vm}")
}

/// `<cluster>_<group>-as`, shared by every machine of a node group
pub fn availability_set_name(cluster: &str, node_group: &str) -> String {
    format!("{cluster}_{node_group}-as")
}

/// `<lb>-backendPool`
pub fn backend_pool_name(lb: &str) -> String {
    format!("{lb}-backendPool")
}

/// `<lb>-outboundBackendPool`, backend pool of an outbound load balancer
pub fn outbound_backend_pool_name(lb: &str) -> String {
    format!("{lb}-outboundBackendPool")
}

/// Health probe of the API server load balancer.
pub const API_SERVER_PROBE_NAME: &str = "HTTPSProbe";
/// Load balancing rule of the API server load balancer.
pub const API_SERVER_LB_RULE_NAME: &str = "LBRuleHTTPS";
/// Outbound rule of an outbound load balancer.
pub const OUTBOUND_NAT_RULE_NAME: &str = "OutboundNATAllProtocols";
/// IP configuration of a bastion host.
pub const BASTION_IP_CONFIG_NAME: &str = "default";
/// IP configuration of a machine NIC.
pub const NIC_IP_CONFIG_NAME: &str = "pipConfig";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_owned_names() {
        assert_eq!(network_interface_name("foo-md-0-abcde"), "foo-md-0-abcde-nic");
        assert_eq!(os_disk_name("foo-md-0-abcde"), "foo-md-0-abcde_OSDisk");
        assert_eq!(data_disk_name("foo-md-0-abcde", "etcddisk"), "foo-md-0-abcde_etcddisk");
        assert_eq!(node_public_ip_name("foo-md-0-abcde"), "pip-foo-md-0-abcde");
        assert_eq!(availability_set_name("foo", "md-0"), "foo_md-0-as");
        assert_eq!(backend_pool_name("foo-public-lb"), "foo-public-lb-backendPool");
        assert_eq!(outbound_backend_pool_name("foo"), "foo-outboundBackendPool");
    }
}
