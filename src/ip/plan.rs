//! Address plan: carving /30 networks out of a private supernet.
//!
//! Every UID maps to one /30 network purely arithmetically, so nothing but
//! the plan itself has to be stored. Subnet numbering starts at an anchor
//! which may sit partway into the supernet; blocks before the anchor are
//! left alone for infrastructure that already lives there.

use crate::error::{AllocError, Result};
use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

/// Prefix length of every dyno network
pub const SUBNET_PREFIX_LEN: u8 = 30;

/// Anchor of the default plan. The first addresses of 172.16/12 are skipped
/// to avoid clashes with cloud infrastructure (e.g. the EC2-classic internal
/// DNS server at 172.16.0.23).
pub const DEFAULT_ANCHOR: Ipv4Addr = Ipv4Addr::new(172, 16, 0, 28);

/// Prefix length of the default supernet (RFC 1918 172.16/12)
pub const DEFAULT_PREFIX_LEN: u8 = 12;

/// 172.16.0.28/12: /30 networks from 172.16/12, starting at 172.16.0.28/30.
/// Provides at most 2^18 subnets.
pub fn default_private_subnet() -> Ipv4Net {
    Ipv4Net::new(DEFAULT_ANCHOR, DEFAULT_PREFIX_LEN).expect("12 is a valid IPv4 prefix length")
}

/// Immutable mapping from subnet index to /30 network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPlan {
    supernet: Ipv4Net,
    anchor: Ipv4Net,
    available: u32,
}

impl AddressPlan {
    /// Build a plan from a single `anchor/prefix` block, e.g. `172.16.0.28/12`
    /// carves /30 networks from 172.16/12 starting at 172.16.0.28/30.
    pub fn from_block(block: Ipv4Net) -> Result<Self> {
        Self::with_anchor(block.trunc(), block.addr())
    }

    /// Build a plan with an explicit anchor inside `supernet`.
    pub fn with_anchor(supernet: Ipv4Net, anchor: Ipv4Addr) -> Result<Self> {
        let prefix_len = supernet.prefix_len();
        if prefix_len > SUBNET_PREFIX_LEN {
            return Err(AllocError::ConfigurationInvalid(format!(
                "supernet {} is smaller than a /{} network",
                supernet, SUBNET_PREFIX_LEN
            )));
        }
        let supernet = supernet.trunc();
        let anchor = Ipv4Net::new(anchor, SUBNET_PREFIX_LEN)
            .map_err(|e| AllocError::ConfigurationInvalid(e.to_string()))?
            .trunc();
        if !supernet.contains(&anchor) {
            return Err(AllocError::ConfigurationInvalid(format!(
                "anchor {} lies outside supernet {}",
                anchor, supernet
            )));
        }

        let total = 1u32 << (SUBNET_PREFIX_LEN - prefix_len);
        let skip = subnets_to_skip(anchor.network(), prefix_len);
        let available = total.checked_sub(skip).filter(|n| *n > 0).ok_or_else(|| {
            AllocError::ConfigurationInvalid(format!(
                "no /{} networks available in {} after {}",
                SUBNET_PREFIX_LEN, supernet, anchor
            ))
        })?;

        Ok(AddressPlan {
            supernet,
            anchor,
            available,
        })
    }

    pub fn supernet(&self) -> Ipv4Net {
        self.supernet
    }

    /// First /30 network handed out
    pub fn anchor(&self) -> Ipv4Net {
        self.anchor
    }

    /// Number of distinct /30 networks at or after the anchor
    pub fn available_subnets(&self) -> u32 {
        self.available
    }

    /// The `shift`-th /30 network after the anchor.
    ///
    /// Fails with [`AllocError::OutOfRange`] if the result leaves the
    /// supernet. Callers reduce `shift` modulo [`available_subnets`], so this
    /// only happens when the accounting itself is broken.
    ///
    /// [`available_subnets`]: AddressPlan::available_subnets
    pub fn subnet_at(&self, shift: u32) -> Result<Ipv4Net> {
        // pick a /30 block
        let block = (u64::from(u32::from(self.anchor.network())) >> 2) + u64::from(shift);
        let raw = block << 2;
        let addr = Ipv4Addr::from(raw as u32);
        if raw > u64::from(u32::MAX) || !self.supernet.contains(&addr) {
            return Err(AllocError::OutOfRange {
                addr,
                supernet: self.supernet,
            });
        }
        Ipv4Net::new(addr, SUBNET_PREFIX_LEN)
            .map_err(|e| AllocError::ConfigurationInvalid(e.to_string()))
    }
}

/// Number of /30 blocks in front of `anchor` inside its supernet.
///
/// These are bits `[prefix_len, 30)` of the anchor: cut the prefix bits,
/// then drop the two bits that vary within a /30.
pub fn subnets_to_skip(anchor: Ipv4Addr, prefix_len: u8) -> u32 {
    // host bits of the supernet; empty for /32 and anything longer
    let hostmask = u32::MAX.checked_shr(u32::from(prefix_len)).unwrap_or(0);
    (u32::from(anchor) & hostmask) >> 2
}

/// The two assignable addresses of a /30 network: one for each end of the
/// point-to-point link.
pub fn host_pair(net: &Ipv4Net) -> (Ipv4Addr, Ipv4Addr) {
    let base = u32::from(net.network());
    (Ipv4Addr::from(base + 1), Ipv4Addr::from(base + 2))
}
