use crate::ip::{default_private_subnet, SUBNET_PREFIX_LEN};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default root under which the `uids` reservation directory lives
pub const DEFAULT_WORK_DIR: &str = "/var/lib/dynoalloc";

pub const DEFAULT_MIN_UID: u32 = 3000;
pub const DEFAULT_MAX_UID: u32 = 60000;

/// Allocator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AllocatorConfig {
    /// Working directory root; markers go to `<work_dir>/uids`
    pub work_dir: PathBuf,
    /// Private block in `anchor/prefix` form, e.g. `172.16.0.28/12`
    pub private_subnet: Ipv4Net,
    pub min_uid: u32,
    pub max_uid: u32,
}

impl AllocatorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.work_dir.as_os_str().is_empty() {
            return Err(ValidationError::InvalidWorkDir(
                "work_dir cannot be empty".to_string(),
            ));
        }

        if self.min_uid > self.max_uid {
            return Err(ValidationError::InvalidUidRange(format!(
                "min_uid {} is greater than max_uid {}",
                self.min_uid, self.max_uid
            )));
        }

        if self.private_subnet.prefix_len() > SUBNET_PREFIX_LEN {
            return Err(ValidationError::InvalidSubnet(format!(
                "{} cannot hold a /{} network",
                self.private_subnet, SUBNET_PREFIX_LEN
            )));
        }

        Ok(())
    }
}

/// Default implementations
impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            private_subnet: default_private_subnet(),
            min_uid: DEFAULT_MIN_UID,
            max_uid: DEFAULT_MAX_UID,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid work directory: {0}")]
    InvalidWorkDir(String),
    #[error("Invalid uid range: {0}")]
    InvalidUidRange(String),
    #[error("Invalid private subnet: {0}")]
    InvalidSubnet(String),
}
