//! In-process key store.

use super::KeyStore;
use std::collections::BTreeSet;
use std::io;
use std::sync::{Mutex, MutexGuard};

/// Key store backed by a mutex-guarded set. Only safe for a single process.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: Mutex<BTreeSet<u32>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<u32>> {
        // the set stays consistent even if a holder panicked
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyStore for MemoryKeyStore {
    fn try_create(&self, key: u32) -> io::Result<bool> {
        Ok(self.lock().insert(key))
    }

    fn remove(&self, key: u32) -> io::Result<()> {
        if self.lock().remove(&key) {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("key {} is not present", key),
            ))
        }
    }

    fn keys(&self) -> io::Result<Vec<u32>> {
        Ok(self.lock().iter().copied().collect())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
