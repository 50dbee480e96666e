//! Resource spec errors

use thiserror::Error;

/// Errors returned while computing desired Azure parameters
#[derive(Debug, Error)]
pub enum SpecError {
    /// The observed Azure state handed to `parameters` is not the type this spec reads
    #[error("existing value is {found}, expected {expected}")]
    ConflictingExistingShape {
        /// Parameter type the resource spec expects
        expected: String,
        /// Description of what was received
        found: String,
    },

    /// A subnet of a user-provided vnet does not exist
    #[error("custom vnet was provided but subnet {name} is missing")]
    MissingSubnet {
        /// Subnet name
        name: String,
    },

    /// A field the resource spec needs was left empty
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// A field holds a value Azure cannot accept
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No frontend port left on the load balancer for a new inbound NAT rule
    #[error("no available frontend port on load balancer {lb}")]
    NoAvailablePort {
        /// Load balancer name
        lb: String,
    },

    /// A provider ID or ARM resource ID could not be parsed
    #[error("invalid provider ID {0:?}")]
    InvalidProviderId(String),

    /// Bootstrap data or SSH key encoding failed
    #[error("encoding error: {0}")]
    Encoding(String),
}
