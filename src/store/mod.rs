//! Exclusive key stores.
//!
//! A key store is a set of reserved integers supporting atomic
//! create-if-absent and delete. It is the only mutual-exclusion primitive
//! the allocator relies on: whoever creates a key owns it until the key is
//! removed again.
//!
//! Two backends are provided:
//!
//! - [`FsKeyStore`]: one zero-length marker file per key inside a directory.
//!   Exclusive create is atomic across independent processes sharing the
//!   filesystem, so several supervisors on one host can race safely.
//! - [`MemoryKeyStore`]: an in-process set, for single-process deployments
//!   and tests.

pub mod fs;
pub mod memory;

pub use fs::FsKeyStore;
pub use memory::MemoryKeyStore;

use std::fmt;
use std::io;

/// Storage capability behind UID reservation
pub trait KeyStore: Send + Sync + fmt::Debug {
    /// Atomically create `key` if it does not exist yet.
    ///
    /// Returns `Ok(true)` when the key was created by this call and
    /// `Ok(false)` when it already existed. Any other failure is an error.
    fn try_create(&self, key: u32) -> io::Result<bool>;

    /// Remove `key`. Fails with [`io::ErrorKind::NotFound`] if it is absent.
    fn remove(&self, key: u32) -> io::Result<()>;

    /// All keys currently present, in ascending order.
    fn keys(&self) -> io::Result<Vec<u32>>;

    /// Human readable location, used in error messages.
    fn location(&self) -> String;
}
