//! Hardware job slot pool
//!
//! A fixed array of job slots, one per accelerator work-queue entry. Each slot
//! carries an atomic lock flag, which is the only synchronization between
//! threads: acquiring a slot is a compare-and-swap on that flag and never
//! blocks. The slot's job context moves into the returned [`JobLease`] and
//! comes back on [`JobPool::release`], so only the lease holder can touch it.
//!
//! Capacity is the total queue depth reported by the driver probe. A failed
//! probe, an empty topology or any per-slot initialization failure leaves the
//! pool permanently disabled.

use accelflate_device::{AcceleratorDriver, HardwareJob, NullAccelerator};
use accelflate_types::{Error, Result};
use crossbeam::utils::Backoff;
use once_cell::sync::OnceCell;
use rand::Rng;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

static GLOBAL_POOL: OnceCell<Arc<JobPool>> = OnceCell::new();

struct JobSlot {
    locked: AtomicBool,
    job: Mutex<Option<Box<dyn HardwareJob>>>,
}

impl JobSlot {
    fn new(job: Box<dyn HardwareJob>) -> Self {
        Self {
            locked: AtomicBool::new(false),
            job: Mutex::new(Some(job)),
        }
    }

    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    fn job(&self) -> MutexGuard<'_, Option<Box<dyn HardwareJob>>> {
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive ownership of one job slot
///
/// Obtained from [`JobPool::acquire`] and handed back with
/// [`JobPool::release`]. Dropping a lease without releasing it leaks the slot.
#[must_use = "a lease must be handed back with JobPool::release"]
#[derive(Debug)]
pub struct JobLease {
    index: usize,
    job: Box<dyn HardwareJob>,
}

impl JobLease {
    /// Slot index in `[0, capacity)`
    pub fn index(&self) -> usize {
        self.index
    }

    /// The slot's job context
    pub fn job(&self) -> &dyn HardwareJob {
        self.job.as_ref()
    }

    /// The slot's job context, mutably
    pub fn job_mut(&mut self) -> &mut dyn HardwareJob {
        self.job.as_mut()
    }
}

/// Pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolStats {
    /// Number of slots
    pub capacity: usize,
    /// Slots currently leased
    pub in_use: usize,
    /// Successful acquisitions
    pub acquired: u64,
    /// Acquisitions that found every probed slot locked
    pub exhausted: u64,
}

/// Fixed-size pool of hardware job slots
pub struct JobPool {
    slots: Box<[JobSlot]>,
    ready: AtomicBool,
    torn_down: AtomicBool,
    driver: String,
    acquired: AtomicU64,
    exhausted: AtomicU64,
}

impl JobPool {
    /// Probe `driver` and initialize one job context per discovered slot
    pub fn initialize(driver: &dyn AcceleratorDriver) -> Self {
        let name = driver.name().to_string();

        let topology = match driver.probe() {
            Ok(topology) => topology,
            Err(e) => {
                warn!(driver = %name, "Accelerator probe failed, hardware path disabled: {}", e);
                return Self::disabled_with_driver(name);
            }
        };

        let capacity = topology.total_queue_depth();
        if capacity == 0 {
            warn!(driver = %name, "No accelerator work queues found, hardware path disabled");
            return Self::disabled_with_driver(name);
        }

        let mut jobs: Vec<Box<dyn HardwareJob>> = Vec::with_capacity(capacity);
        for index in 0..capacity {
            match driver.init_job(index) {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    warn!(driver = %name, slot = index, "Job initialization failed, hardware path disabled: {}", e);
                    for job in &mut jobs {
                        job.finalize();
                    }
                    return Self::disabled_with_driver(name);
                }
            }
        }

        debug!(
            driver = %name,
            capacity,
            work_queues = topology.work_queue_count(),
            "Hardware job pool ready"
        );
        Self {
            slots: jobs.into_iter().map(JobSlot::new).collect(),
            ready: AtomicBool::new(true),
            torn_down: AtomicBool::new(false),
            driver: name,
            acquired: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
        }
    }

    /// Probe `driver` and wrap the pool for sharing
    pub fn shared(driver: &dyn AcceleratorDriver) -> Arc<Self> {
        Arc::new(Self::initialize(driver))
    }

    /// A pool with no slots
    pub fn disabled() -> Self {
        Self::disabled_with_driver(NullAccelerator.name().to_string())
    }

    fn disabled_with_driver(driver: String) -> Self {
        Self {
            slots: Box::new([]),
            ready: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
            driver,
            acquired: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
        }
    }

    /// Install the process-wide pool
    ///
    /// Only the first call initializes; later calls return the existing pool
    /// without probing `driver`.
    pub fn install_global(driver: &dyn AcceleratorDriver) -> Arc<Self> {
        Arc::clone(GLOBAL_POOL.get_or_init(|| Self::shared(driver)))
    }

    /// The process-wide pool, initialized on first use with [`NullAccelerator`]
    /// unless [`JobPool::install_global`] ran before
    pub fn global() -> Arc<Self> {
        Self::install_global(&NullAccelerator)
    }

    /// Tear down the process-wide pool if it was ever initialized
    pub fn shutdown_global() {
        if let Some(pool) = GLOBAL_POOL.get() {
            pool.shutdown();
        }
    }

    /// Whether initialization succeeded with a non-zero capacity
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Number of job slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Name of the driver the pool was built from
    pub fn driver_name(&self) -> &str {
        &self.driver
    }

    /// Lock a free slot and take its job context
    ///
    /// Open addressing with a random start: probing begins at a uniformly
    /// random slot and walks forward, wrapping around, for at most `capacity`
    /// compare-and-swap attempts. The call never blocks and finds a free slot
    /// whenever one exists at the time it is visited. When every probed slot
    /// is locked it returns [`Error::PoolExhausted`] and the caller falls back
    /// to software.
    pub fn acquire(&self) -> Result<JobLease> {
        let capacity = self.slots.len();
        if self.is_ready() {
            let start = rand::thread_rng().gen_range(0..capacity);
            for offset in 0..capacity {
                let index = (start + offset) % capacity;
                let slot = &self.slots[index];
                if !slot.try_lock() {
                    continue;
                }
                if let Some(job) = slot.job().take() {
                    self.acquired.fetch_add(1, Ordering::Relaxed);
                    return Ok(JobLease { index, job });
                }
                // torn down underneath us
                slot.unlock();
            }
        }

        self.exhausted.fetch_add(1, Ordering::Relaxed);
        info!(capacity, "Job pool exhausted, falling back to software");
        Err(Error::PoolExhausted { capacity })
    }

    /// Return a lease's job context to its slot and unlock it
    pub fn release(&self, lease: JobLease) {
        let JobLease { index, job } = lease;
        debug_assert!(index < self.slots.len(), "lease from another pool");
        let Some(slot) = self.slots.get(index) else {
            return;
        };
        *slot.job() = Some(job);
        slot.unlock();
    }

    /// Number of slots currently leased
    pub fn in_use(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.locked.load(Ordering::Acquire))
            .count()
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            in_use: self.in_use(),
            acquired: self.acquired.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }

    /// Finalize every job context and disable the pool
    ///
    /// Waits for each slot to be released before finalizing it; a lease that
    /// is never released blocks this call. Slots stay locked afterwards, so
    /// later acquisitions report exhaustion. Calling it again is a no-op.
    pub fn shutdown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.ready.store(false, Ordering::Release);

        for slot in self.slots.iter() {
            let backoff = Backoff::new();
            while !slot.try_lock() {
                backoff.snooze();
            }
            if let Some(mut job) = slot.job().take() {
                job.finalize();
            }
        }
        debug!(driver = %self.driver, capacity = self.slots.len(), "Hardware job pool torn down");
    }
}

impl Drop for JobPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for JobPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobPool")
            .field("driver", &self.driver)
            .field("capacity", &self.capacity())
            .field("ready", &self.is_ready())
            .field("in_use", &self.in_use())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accelflate_device::{SimulatedAccelerator, SimulatedConfig};
    use rstest::rstest;
    use std::collections::HashSet;
    use std::thread;

    #[rstest]
    #[case(vec![1], 1)]
    #[case(vec![4], 4)]
    #[case(vec![2, 3, 5], 10)]
    fn test_capacity_is_total_queue_depth(#[case] depths: Vec<usize>, #[case] expected: usize) {
        let driver = SimulatedAccelerator::new(SimulatedConfig {
            queue_depths: depths,
            completion_polls: 0,
        });
        let pool = JobPool::initialize(&driver);
        assert!(pool.is_ready());
        assert_eq!(pool.capacity(), expected);
        assert_eq!(pool.driver_name(), "simulated");
    }

    #[test]
    fn test_probe_failure_disables_pool() {
        let driver = SimulatedAccelerator::with_capacity(4);
        driver.faults().fail_probe(true);
        let pool = JobPool::initialize(&driver);
        assert!(!pool.is_ready());
        assert_eq!(pool.capacity(), 0);
        assert!(matches!(
            pool.acquire(),
            Err(Error::PoolExhausted { capacity: 0 })
        ));
    }

    #[test]
    fn test_zero_capacity_disables_pool() {
        let pool = JobPool::initialize(&SimulatedAccelerator::with_capacity(0));
        assert!(!pool.is_ready());
        assert!(!JobPool::initialize(&NullAccelerator).is_ready());
        assert!(!JobPool::disabled().is_ready());
    }

    #[test]
    fn test_partial_initialization_is_not_exposed() {
        let driver = SimulatedAccelerator::with_capacity(4);
        driver.faults().fail_next_inits(1);
        let pool = JobPool::initialize(&driver);
        assert!(!pool.is_ready());
        assert_eq!(pool.capacity(), 0);
    }

    #[test]
    fn test_acquire_until_exhausted() {
        let pool = JobPool::initialize(&SimulatedAccelerator::with_capacity(4));
        let leases: Vec<_> = (0..4).map(|_| pool.acquire().unwrap()).collect();

        let indices: HashSet<_> = leases.iter().map(JobLease::index).collect();
        assert_eq!(indices.len(), 4);
        assert_eq!(pool.in_use(), 4);
        assert!(matches!(
            pool.acquire(),
            Err(Error::PoolExhausted { capacity: 4 })
        ));

        for lease in leases {
            pool.release(lease);
        }
        let stats = pool.stats();
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.acquired, 4);
        assert_eq!(stats.exhausted, 1);

        let lease = pool.acquire().unwrap();
        pool.release(lease);
    }

    #[test]
    fn test_last_free_slot_is_always_found() {
        let pool = JobPool::initialize(&SimulatedAccelerator::with_capacity(8));
        let mut held: Vec<_> = (0..8).map(|_| pool.acquire().unwrap()).collect();
        let spare = held.remove(3);
        let free_index = spare.index();
        pool.release(spare);

        // any random start must wrap around to the single free slot
        for _ in 0..200 {
            let lease = pool.acquire().unwrap();
            assert_eq!(lease.index(), free_index);
            pool.release(lease);
        }
        assert_eq!(pool.stats().exhausted, 0);

        for lease in held {
            pool.release(lease);
        }
    }

    #[test]
    fn test_lease_indices_spread_over_slots() {
        let pool = JobPool::initialize(&SimulatedAccelerator::with_capacity(8));
        let mut first_indices = HashSet::new();
        for _ in 0..400 {
            let lease = pool.acquire().unwrap();
            first_indices.insert(lease.index());
            pool.release(lease);
        }
        // an uncontended pool still starts at random slots
        assert!(first_indices.len() > 1);
    }

    #[test]
    fn test_concurrent_acquire_never_shares_a_slot() {
        let pool = Arc::new(JobPool::initialize(&SimulatedAccelerator::with_capacity(3)));
        let occupied: Arc<Vec<AtomicBool>> =
            Arc::new((0..3).map(|_| AtomicBool::new(false)).collect());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let occupied = Arc::clone(&occupied);
                thread::spawn(move || {
                    for _ in 0..500 {
                        if let Ok(lease) = pool.acquire() {
                            let flag = &occupied[lease.index()];
                            assert!(!flag.swap(true, Ordering::SeqCst), "slot shared");
                            thread::yield_now();
                            flag.store(false, Ordering::SeqCst);
                            pool.release(lease);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_shutdown_disables_acquire() {
        let pool = JobPool::initialize(&SimulatedAccelerator::with_capacity(2));
        pool.shutdown();
        assert!(!pool.is_ready());
        assert!(pool.acquire().is_err());
        pool.shutdown();
    }

    #[test]
    fn test_shutdown_waits_for_outstanding_lease() {
        let pool = Arc::new(JobPool::initialize(&SimulatedAccelerator::with_capacity(1)));
        let lease = pool.acquire().unwrap();

        let releaser = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                thread::sleep(std::time::Duration::from_millis(20));
                pool.release(lease);
            })
        };
        pool.shutdown();
        releaser.join().unwrap();
        assert!(!pool.is_ready());
    }
}
