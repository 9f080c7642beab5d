//! Slot occupancy recording
//!
//! Threads report when they start and stop using a slot. Entering a slot that
//! is already held counts as a violation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Records which slots are held and detects double occupancy
#[derive(Debug)]
pub struct SlotOccupancy {
    held: Vec<AtomicBool>,
    entries: AtomicUsize,
    violations: AtomicUsize,
    peak: AtomicUsize,
    current: AtomicUsize,
}

impl SlotOccupancy {
    /// Recorder for `capacity` slots
    pub fn new(capacity: usize) -> Self {
        Self {
            held: (0..capacity).map(|_| AtomicBool::new(false)).collect(),
            entries: AtomicUsize::new(0),
            violations: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            current: AtomicUsize::new(0),
        }
    }

    /// Mark `slot` as held; returns `false` if it already was
    pub fn enter(&self, slot: usize) -> bool {
        self.entries.fetch_add(1, Ordering::Relaxed);
        if self.held[slot].swap(true, Ordering::AcqRel) {
            self.violations.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        let now = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        true
    }

    /// Mark `slot` as free again
    pub fn leave(&self, slot: usize) {
        if self.held[slot].swap(false, Ordering::AcqRel) {
            self.current.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Number of `enter` calls
    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }

    /// Times a slot was entered while already held
    pub fn violations(&self) -> usize {
        self.violations.load(Ordering::Relaxed)
    }

    /// Highest number of slots held at once
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Slots held right now
    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}
