//! Validation helpers shared by the v1beta1 kinds

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Maximum cluster name length.
pub const CLUSTER_NAME_MAX_LENGTH: usize = 44;
/// Maximum Azure resource group name length.
pub const RESOURCE_GROUP_MAX_LENGTH: usize = 90;
/// Maximum security rule description length.
pub const SECURITY_RULE_DESCRIPTION_MAX_LENGTH: usize = 140;

/// Cluster names.
pub const CLUSTER_NAME_REGEX: &str = r"^[a-z0-9][a-z0-9-]{0,42}[a-z0-9]$";
/// Azure resource group names.
pub const RESOURCE_GROUP_REGEX: &str = r"^[-\w\._\(\)]+[-\w_\(\)]$";
/// Subnet names.
pub const SUBNET_NAME_REGEX: &str = r"^[-\w\._]+$";
/// Load balancer names.
pub const LOAD_BALANCER_NAME_REGEX: &str = r"^[-\w\._]+$";
/// Private DNS zone names.
pub const PRIVATE_DNS_ZONE_NAME_REGEX: &str = r"^[a-zA-Z0-9_][a-zA-Z0-9_\-\.]*[a-zA-Z0-9_]$";

// A pattern that fails to compile matches nothing, so validation fails closed.
static CLUSTER_NAME_RE: LazyLock<Option<Regex>> = LazyLock::new(|| ascii_regex(CLUSTER_NAME_REGEX));
static RESOURCE_GROUP_RE: LazyLock<Option<Regex>> = LazyLock::new(|| ascii_regex(RESOURCE_GROUP_REGEX));
static SUBNET_NAME_RE: LazyLock<Option<Regex>> = LazyLock::new(|| ascii_regex(SUBNET_NAME_REGEX));
static LOAD_BALANCER_NAME_RE: LazyLock<Option<Regex>> = LazyLock::new(|| ascii_regex(LOAD_BALANCER_NAME_REGEX));
static PRIVATE_DNS_ZONE_NAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| ascii_regex(PRIVATE_DNS_ZONE_NAME_REGEX));

/// Azure names are ASCII: `\w` must not match letters such as `ü`.
fn ascii_regex(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).unicode(false).build().ok()
}

fn is_match(re: &LazyLock<Option<Regex>>, value: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(value))
}

/// True for a valid cluster name.
pub fn is_valid_cluster_name(name: &str) -> bool {
    is_match(&CLUSTER_NAME_RE, name)
}

/// True for a valid resource group name.
pub fn is_valid_resource_group(name: &str) -> bool {
    name.len() <= RESOURCE_GROUP_MAX_LENGTH && is_match(&RESOURCE_GROUP_RE, name)
}

/// True for a valid subnet name.
pub fn is_valid_subnet_name(name: &str) -> bool {
    is_match(&SUBNET_NAME_RE, name)
}

/// True for a valid load balancer name.
pub fn is_valid_load_balancer_name(name: &str) -> bool {
    is_match(&LOAD_BALANCER_NAME_RE, name)
}

/// True for a valid private DNS zone name.
pub fn is_valid_private_dns_zone_name(name: &str) -> bool {
    is_match(&PRIVATE_DNS_ZONE_NAME_RE, name)
}

/// Go-style rendering of a string list: `[a b c]`.
pub(crate) fn format_list(values: &[String]) -> String {
    format!("[{}]", values.join(" "))
}
