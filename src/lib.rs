//! # Dynoalloc - per-host UID and private network allocation
//!
//! This library is the resource-allocation core of a per-host dyno
//! supervisor. It hands out UIDs that are unique on the host to newly started
//! dynos and derives a private, non-overlapping IPv4 /30 network for each of
//! them, so every dyno gets its own point-to-point segment without a central
//! coordinator.
//!
//! ## Overview
//!
//! - **Reservation**: UIDs are claimed by atomically creating a marker file
//!   named after the UID. Exclusive create works across independent
//!   processes, so several supervisors on one host can share a directory.
//! - **Derivation**: the network of a UID is computed from the UID and the
//!   configured private block alone. Nothing else is stored.
//!
//! ## Architecture
//!
//! - `allocator`: the [`Allocator`] and its UID range
//! - `store`: exclusive key stores (directory and in-memory backends)
//! - `ip`: address plan, /30 derivation and address-space accounting
//! - `config`: YAML configuration structures and validation
//! - `config_loader`: configuration file loading and CLI overrides
//! - `error`: the [`AllocError`] taxonomy
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dynoalloc::{ip, Allocator};
//!
//! let allocator = Allocator::new("/var/lib/dynoalloc", ip::default_private_subnet(), 3000, 60000)?;
//!
//! let uid = allocator.reserve_uid()?;
//! let net = allocator.subnet_for(uid)?;
//! let (gateway, dyno) = ip::host_pair(&net);
//! println!("uid {} gets {} ({} <-> {})", uid, net, gateway, dyno);
//!
//! allocator.free_uid(uid)?;
//! # Ok::<(), dynoalloc::AllocError>(())
//! ```
//!
//! ## On-disk Layout
//!
//! ```text
//! <work_dir>/uids/        mode 0700
//! <work_dir>/uids/3017    zero-length, mode 0600, one per reserved uid
//! ```
//!
//! A crashed reserver leaves its marker behind; reclaiming it is up to
//! out-of-band cleanup.
//!
//! ## Error Handling
//!
//! Library operations return [`AllocError`]; nothing is logged and swallowed.
//! The binary reports errors with `color_eyre`.

pub mod allocator;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod ip;
pub mod store;

pub use allocator::{Allocator, UidRange};
pub use error::{AllocError, Result};
