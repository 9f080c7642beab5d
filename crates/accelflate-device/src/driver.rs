//! Accelerator driver abstraction
//!
//! A driver answers two questions for the job pool: how many job slots the
//! platform offers (the topology probe) and how to initialize the hardware job
//! context behind each slot.

use crate::job::HardwareJob;
use crate::topology::Topology;
use accelflate_types::{Error, Result};
use std::fmt;

/// Platform access to an accelerator
pub trait AcceleratorDriver: Send + Sync + fmt::Debug {
    /// Short driver name used in logs
    fn name(&self) -> &str;

    /// Discover devices and work queues
    fn probe(&self) -> Result<Topology>;

    /// Initialize the hardware job context for slot `index`
    fn init_job(&self, index: usize) -> Result<Box<dyn HardwareJob>>;
}

/// Driver for hosts without an accelerator
///
/// Its probe always fails, which leaves the job pool disabled and routes every
/// call to the software tier.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAccelerator;

impl AcceleratorDriver for NullAccelerator {
    fn name(&self) -> &str {
        "none"
    }

    fn probe(&self) -> Result<Topology> {
        Err(Error::device_detection("no accelerator driver available"))
    }

    fn init_job(&self, index: usize) -> Result<Box<dyn HardwareJob>> {
        Err(Error::initialization(
            format!("hardware job {}", index),
            "no accelerator driver available",
        ))
    }
}
