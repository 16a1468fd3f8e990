//! Allocation errors.
//!
//! Every failure in the allocator is returned to the immediate caller.
//! The only condition absorbed internally is a marker that already exists
//! during reservation, which simply triggers another probe.

use ipnet::Ipv4Net;
use std::io;
use std::net::Ipv4Addr;

/// Result type for allocator operations
pub type Result<T> = std::result::Result<T, AllocError>;

/// Errors that can occur while reserving, freeing or addressing UIDs
#[derive(Debug, thiserror::Error)]
pub enum AllocError {
    /// Every probe within the retry budget collided with a live marker
    #[error("no free number available at {location} after {attempts} attempts")]
    CapacityExhausted { location: String, attempts: u64 },

    /// Unexpected I/O failure in the backing store
    #[error("storage failure at {location}: {source}")]
    Storage {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("uid {uid} is not reserved")]
    NotReserved { uid: u32 },

    #[error("invalid allocator configuration: {0}")]
    ConfigurationInvalid(String),

    /// The derived subnet escaped the supernet. This means the address-space
    /// accounting is wrong and must never be papered over.
    #[error("the assigned IP {addr} falls out of the allowed subnet {supernet}")]
    OutOfRange { addr: Ipv4Addr, supernet: Ipv4Net },

    #[error("uid {uid} is outside the configured range [{min}, {max}]")]
    UidOutOfBounds { uid: u32, min: u32, max: u32 },

    #[error("could not seed the probe random source: {0}")]
    Entropy(#[from] rand::Error),
}

impl AllocError {
    pub(crate) fn storage(location: impl Into<String>, source: io::Error) -> Self {
        AllocError::Storage {
            location: location.into(),
            source,
        }
    }

    /// Whether a caller may reasonably retry the operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AllocError::CapacityExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_names_location() {
        let err = AllocError::CapacityExhausted {
            location: "/tmp/work/uids".to_string(),
            attempts: 5,
        };
        assert!(err.to_string().contains("/tmp/work/uids"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_storage_error_keeps_source() {
        use std::error::Error;

        let err = AllocError::storage("/nope", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(!err.is_retryable());
        assert!(err.source().is_some());
    }
}
