//! Private network derivation.
//!
//! Each reserved UID owns one /30 IPv4 network carved from a configured
//! private supernet, giving every dyno its own point-to-point segment
//! without a central coordinator.

pub mod plan;

// Re-export commonly used types
pub use plan::{default_private_subnet, host_pair, subnets_to_skip, AddressPlan, SUBNET_PREFIX_LEN};
