//! accelflate integration test support
//!
//! Shared data generators and concurrency recorders for the cross-crate tests
//! under `tests/`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Slot occupancy recording for mutual-exclusion checks
pub mod concurrency_utils;

/// Test data generation
pub mod test_utils;
