//! Per-host resource allocation.
//!
//! The [`Allocator`] hands out UIDs that are unique on this host and maps
//! each of them to a private /30 network.
//!
//! Reservation is optimistic: a random candidate in `[min_uid, max_uid]` is
//! claimed by atomically creating its marker in the key store. If the marker
//! already exists another caller owns that UID and a new candidate is drawn.
//! Random probing avoids listing the store on every attempt and keeps
//! concurrent reservers from marching over the same candidates.

pub mod range;

pub use range::UidRange;

use crate::config::AllocatorConfig;
use crate::error::{AllocError, Result};
use crate::ip::AddressPlan;
use crate::store::{FsKeyStore, KeyStore};
use ipnet::Ipv4Net;
use log::{debug, info};
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use std::io;
use std::path::Path;
use std::sync::Mutex;

/// Attempts per possible UID before a reservation gives up.
///
/// With uniform probing into an interval of size n, finding one specific free
/// slot takes about n draws when occupancy is high; five times that keeps
/// false exhaustion rare.
pub const RETRY_FACTOR: u64 = 5;

/// Allocates globally unique (per host) UIDs and their private networks
#[derive(Debug)]
pub struct Allocator<S = FsKeyStore> {
    store: S,
    plan: AddressPlan,
    range: UidRange,
    /// Cheap generator seeded from the OS; only decides probe order.
    rng: Mutex<StdRng>,
}

impl Allocator<FsKeyStore> {
    /// Create a filesystem-backed allocator keeping markers in
    /// `<work_dir>/uids`.
    ///
    /// `private_subnet` is given as `anchor/prefix`: all subnets will be at or
    /// after the anchor, e.g. `172.16.0.28/12` causes /30 networks to be
    /// allocated from 172.16/12 starting at 172.16.0.28/30.
    pub fn new(
        work_dir: impl AsRef<Path>,
        private_subnet: Ipv4Net,
        min_uid: u32,
        max_uid: u32,
    ) -> Result<Self> {
        let plan = AddressPlan::from_block(private_subnet)?;
        let range = UidRange::new(min_uid, max_uid)?;
        // nothing touches the disk until the configuration is known to be sound
        check_capacity(&plan, range)?;

        let work_dir = work_dir.as_ref();
        let store = FsKeyStore::open(work_dir)
            .map_err(|e| AllocError::storage(work_dir.display().to_string(), e))?;
        Self::with_store(store, plan, range)
    }

    /// Create a filesystem-backed allocator from a loaded configuration
    pub fn from_config(config: &AllocatorConfig) -> Result<Self> {
        Self::new(
            &config.work_dir,
            config.private_subnet,
            config.min_uid,
            config.max_uid,
        )
    }
}

impl<S: KeyStore> Allocator<S> {
    /// Create an allocator over an arbitrary key store.
    ///
    /// Fails if the UID range is larger than the number of /30 networks the
    /// plan provides, since two live UIDs could then share a network.
    pub fn with_store(store: S, plan: AddressPlan, range: UidRange) -> Result<Self> {
        check_capacity(&plan, range)?;
        let rng = StdRng::from_rng(OsRng)?;

        info!(
            "Allocator ready: uids {} in {}, networks from {} ({} available)",
            range,
            store.location(),
            plan.anchor(),
            plan.available_subnets()
        );

        Ok(Allocator {
            store,
            plan,
            range,
            rng: Mutex::new(rng),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn plan(&self) -> &AddressPlan {
        &self.plan
    }

    pub fn range(&self) -> UidRange {
        self.range
    }

    /// Upper bound of probes made by a single [`reserve_uid`] call
    ///
    /// [`reserve_uid`]: Allocator::reserve_uid
    pub fn max_attempts(&self) -> u64 {
        RETRY_FACTOR * self.range.len()
    }

    /// Reserve a free UID.
    ///
    /// Multiple processes sharing the same store never obtain the same UID.
    /// UIDs must be returned with [`free_uid`] once they are not needed.
    ///
    /// [`free_uid`]: Allocator::free_uid
    pub fn reserve_uid(&self) -> Result<u32> {
        let attempts = self.max_attempts();
        for _ in 0..attempts {
            let uid = self.draw();
            // check if free by optimistically locking this uid
            let created = self
                .store
                .try_create(uid)
                .map_err(|e| AllocError::storage(self.store.location(), e))?;
            if created {
                info!("Reserved uid {} at {}", uid, self.store.location());
                return Ok(uid);
            }
            debug!("uid {} already taken, probing again", uid);
        }
        Err(AllocError::CapacityExhausted {
            location: self.store.location(),
            attempts,
        })
    }

    /// Return `uid` to the pool. Freeing a UID that is not reserved is an
    /// error.
    pub fn free_uid(&self, uid: u32) -> Result<()> {
        match self.store.remove(uid) {
            Ok(()) => {
                debug!("Freed uid {} at {}", uid, self.store.location());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(AllocError::NotReserved { uid }),
            Err(e) => Err(AllocError::storage(self.store.location(), e)),
        }
    }

    /// The /30 network belonging to `uid`.
    ///
    /// Pure arithmetic on the configuration: the same UID always maps to the
    /// same network, and UIDs within one range never share a network.
    pub fn subnet_for(&self, uid: u32) -> Result<Ipv4Net> {
        if !self.range.contains(uid) {
            return Err(AllocError::UidOutOfBounds {
                uid,
                min: self.range.min(),
                max: self.range.max(),
            });
        }
        let shift = (uid - self.range.min()) % self.plan.available_subnets();
        self.plan.subnet_at(shift)
    }

    /// UIDs currently reserved in the store, ascending
    pub fn reserved_uids(&self) -> Result<Vec<u32>> {
        self.store
            .keys()
            .map_err(|e| AllocError::storage(self.store.location(), e))
    }

    fn draw(&self) -> u32 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(self.range.min()..=self.range.max())
    }
}

/// Two live UIDs may never share a network, so the range must fit the plan.
fn check_capacity(plan: &AddressPlan, range: UidRange) -> Result<()> {
    if range.len() > u64::from(plan.available_subnets()) {
        return Err(AllocError::ConfigurationInvalid(format!(
            "uid range {} holds {} uids but {} only provides {} /30 networks after {}",
            range,
            range.len(),
            plan.supernet(),
            plan.available_subnets(),
            plan.anchor()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::default_private_subnet;
    use crate::store::MemoryKeyStore;
    use std::collections::HashSet;

    fn memory_allocator(block: &str, min: u32, max: u32) -> Allocator<MemoryKeyStore> {
        let plan = AddressPlan::from_block(block.parse().unwrap()).unwrap();
        let range = UidRange::new(min, max).unwrap();
        Allocator::with_store(MemoryKeyStore::new(), plan, range).unwrap()
    }

    #[test]
    fn test_reserve_distinct_uids_in_range() {
        let alloc = memory_allocator("10.0.0.0/8", 100, 139);
        let uids: HashSet<u32> = (0..20).map(|_| alloc.reserve_uid().unwrap()).collect();
        assert_eq!(uids.len(), 20);
        assert!(uids.iter().all(|uid| (100..=139).contains(uid)));
        assert_eq!(alloc.reserved_uids().unwrap().len(), 20);
    }

    #[test]
    fn test_exhaustion_reports_attempts() {
        let alloc = memory_allocator("10.0.0.0/8", 7, 7);
        assert_eq!(alloc.reserve_uid().unwrap(), 7);

        match alloc.reserve_uid().unwrap_err() {
            AllocError::CapacityExhausted { location, attempts } => {
                assert_eq!(location, "memory");
                assert_eq!(attempts, RETRY_FACTOR);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_free_unreserved_uid() {
        let alloc = memory_allocator("10.0.0.0/8", 0, 3);
        assert!(matches!(
            alloc.free_uid(2),
            Err(AllocError::NotReserved { uid: 2 })
        ));
    }

    #[test]
    fn test_free_then_reserve_again() {
        let alloc = memory_allocator("10.0.0.0/8", 5, 5);
        assert_eq!(alloc.reserve_uid().unwrap(), 5);
        alloc.free_uid(5).unwrap();
        assert_eq!(alloc.reserve_uid().unwrap(), 5);
        assert_eq!(alloc.reserved_uids().unwrap(), vec![5]);
    }

    #[test]
    fn test_subnet_for_default_plan() {
        let plan = AddressPlan::from_block(default_private_subnet()).unwrap();
        let range = UidRange::new(3000, 60000).unwrap();
        let alloc = Allocator::with_store(MemoryKeyStore::new(), plan, range).unwrap();

        assert_eq!(alloc.subnet_for(3000).unwrap(), "172.16.0.28/30".parse::<Ipv4Net>().unwrap());
        assert_eq!(alloc.subnet_for(3001).unwrap(), "172.16.0.32/30".parse::<Ipv4Net>().unwrap());
    }

    #[test]
    fn test_subnet_for_out_of_bounds_uid() {
        let alloc = memory_allocator("10.0.0.0/8", 10, 20);
        assert!(matches!(
            alloc.subnet_for(9),
            Err(AllocError::UidOutOfBounds { uid: 9, min: 10, max: 20 })
        ));
        assert!(alloc.subnet_for(21).is_err());
    }

    #[test]
    fn test_range_larger_than_plan_rejected() {
        // a /28 holds four /30 networks
        let plan = AddressPlan::from_block("192.168.0.0/28".parse().unwrap()).unwrap();
        let range = UidRange::new(0, 4).unwrap();
        let result = Allocator::with_store(MemoryKeyStore::new(), plan, range);
        assert!(matches!(result, Err(AllocError::ConfigurationInvalid(_))));

        let range = UidRange::new(0, 3).unwrap();
        assert!(Allocator::with_store(MemoryKeyStore::new(), plan, range).is_ok());
    }

    #[test]
    fn test_allocator_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Allocator<MemoryKeyStore>>();
        assert_sync::<Allocator<FsKeyStore>>();
    }
}
