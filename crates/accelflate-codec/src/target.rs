//! Shared decompression destinations

use accelflate_types::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct TargetState {
    data: Mutex<Vec<u8>>,
    pending: AtomicBool,
}

/// Destination of a decompression request
///
/// A cheap handle to a shared buffer. Synchronous and software decompression
/// fill it before returning. For a request accepted by the accelerator in
/// asynchronous mode the buffer is filled when the codec is flushed; until
/// then [`DecompressTarget::is_pending`] reports `true`.
#[derive(Debug, Clone, Default)]
pub struct DecompressTarget {
    state: Arc<TargetState>,
}

impl DecompressTarget {
    /// An empty target
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an accepted asynchronous job has yet to fill the buffer
    pub fn is_pending(&self) -> bool {
        self.state.pending.load(Ordering::Acquire)
    }

    /// Current length of the buffer
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Copy of the buffer contents
    pub fn to_vec(&self) -> Vec<u8> {
        self.data().clone()
    }

    /// Move the buffer contents out, leaving the target empty
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.data())
    }

    /// Whether two handles refer to the same buffer
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn mark_pending(&self) {
        self.state.pending.store(true, Ordering::Release);
    }

    /// Replace the contents with `bytes` and clear the pending flag
    pub(crate) fn fill(&self, bytes: &[u8]) {
        let mut data = self.data();
        data.clear();
        data.extend_from_slice(bytes);
        self.state.pending.store(false, Ordering::Release);
    }

    /// Size the buffer to `len` and let `write` produce into it
    ///
    /// The buffer is truncated to the reported length, or cleared on error.
    pub(crate) fn write_with<F>(&self, len: usize, write: F) -> Result<usize>
    where
        F: FnOnce(&mut [u8]) -> Result<usize>,
    {
        let mut data = self.data();
        data.clear();
        data.resize(len, 0);
        let result = write(data.as_mut_slice());
        match result {
            Ok(produced) => data.truncate(produced),
            Err(_) => data.clear(),
        }
        self.state.pending.store(false, Ordering::Release);
        result
    }

    fn data(&self) -> MutexGuard<'_, Vec<u8>> {
        self.state.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accelflate_types::Error;

    #[test]
    fn test_clones_share_the_buffer() {
        let target = DecompressTarget::new();
        let handle = target.clone();
        handle.fill(b"shared");
        assert_eq!(target.to_vec(), b"shared");
        assert!(target.same_buffer(&handle));
        assert!(!target.same_buffer(&DecompressTarget::new()));
    }

    #[test]
    fn test_write_with_truncates_to_produced() {
        let target = DecompressTarget::new();
        let produced = target
            .write_with(16, |buf| {
                buf[..3].copy_from_slice(b"abc");
                Ok(3)
            })
            .unwrap();
        assert_eq!(produced, 3);
        assert_eq!(target.take(), b"abc");
        assert!(target.is_empty());
    }

    #[test]
    fn test_write_with_clears_on_error() {
        let target = DecompressTarget::new();
        target.fill(b"old contents");
        target.mark_pending();
        let result = target.write_with(8, |_| Err(Error::decompression("corrupt")));
        assert!(result.is_err());
        assert_eq!(target.len(), 0);
        assert!(!target.is_pending());
    }

    #[test]
    fn test_pending_cleared_by_fill() {
        let target = DecompressTarget::new();
        target.mark_pending();
        assert!(target.is_pending());
        target.fill(b"done");
        assert!(!target.is_pending());
    }
}
