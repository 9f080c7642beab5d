//! In-flight asynchronous decompression jobs
//!
//! An arena indexed by slot number. A job id is the index of the slot it runs
//! on, and a slot is locked for as long as its entry exists, so ids never
//! collide.

use crate::pool::JobLease;
use crate::target::DecompressTarget;
use accelflate_types::JobId;

/// One accepted asynchronous request
#[derive(Debug)]
pub struct PendingDecompression {
    /// Lease on the slot running the job
    pub lease: JobLease,
    /// Where the output goes once the job completes
    pub target: DecompressTarget,
}

/// Jobs submitted but not yet confirmed complete
#[derive(Debug, Default)]
pub struct AsyncJobRegistry {
    entries: Vec<Option<PendingDecompression>>,
    len: usize,
}

impl AsyncJobRegistry {
    /// Registry sized for a pool of `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: std::iter::repeat_with(|| None).take(capacity).collect(),
            len: 0,
        }
    }

    /// Record an accepted job and return its id
    pub fn insert(&mut self, lease: JobLease, target: DecompressTarget) -> JobId {
        let slot = lease.index();
        if slot >= self.entries.len() {
            self.entries.resize_with(slot + 1, || None);
        }
        let previous = self.entries[slot].replace(PendingDecompression { lease, target });
        debug_assert!(previous.is_none(), "slot {} registered twice", slot);
        if previous.is_none() {
            self.len += 1;
        }
        JobId::from_slot(slot)
    }

    /// Entry for `id`, if still pending
    pub fn get_mut(&mut self, id: JobId) -> Option<&mut PendingDecompression> {
        self.entries.get_mut(id.slot()).and_then(Option::as_mut)
    }

    /// Remove and return the entry for `id`
    pub fn remove(&mut self, id: JobId) -> Option<PendingDecompression> {
        let entry = self.entries.get_mut(id.slot()).and_then(Option::take);
        if entry.is_some() {
            self.len -= 1;
        }
        entry
    }

    /// Ids of every pending job, in slot order
    pub fn ids(&self) -> Vec<JobId> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_some())
            .map(|(slot, _)| JobId::from_slot(slot))
            .collect()
    }

    /// Remove every entry
    pub fn drain(&mut self) -> impl Iterator<Item = PendingDecompression> + '_ {
        self.len = 0;
        self.entries.iter_mut().filter_map(Option::take)
    }

    /// Number of pending jobs
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::JobPool;
    use accelflate_device::SimulatedAccelerator;

    #[test]
    fn test_job_id_is_slot_index() {
        let pool = JobPool::initialize(&SimulatedAccelerator::with_capacity(4));
        let mut registry = AsyncJobRegistry::with_capacity(pool.capacity());

        let lease = pool.acquire().unwrap();
        let slot = lease.index();
        let id = registry.insert(lease, DecompressTarget::new());
        assert_eq!(id.slot(), slot);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.ids(), vec![id]);
        assert!(registry.get_mut(id).is_some());

        let entry = registry.remove(id).unwrap();
        assert!(registry.is_empty());
        assert!(registry.remove(id).is_none());
        pool.release(entry.lease);
    }

    #[test]
    fn test_drain_empties_registry() {
        let pool = JobPool::initialize(&SimulatedAccelerator::with_capacity(3));
        let mut registry = AsyncJobRegistry::with_capacity(pool.capacity());
        for _ in 0..3 {
            let lease = pool.acquire().unwrap();
            registry.insert(lease, DecompressTarget::new());
        }
        assert_eq!(registry.len(), 3);

        let drained: Vec<_> = registry.drain().collect();
        assert_eq!(drained.len(), 3);
        assert!(registry.is_empty());
        for entry in drained {
            pool.release(entry.lease);
        }
        assert_eq!(pool.in_use(), 0);
    }
}
