//! Accelerator abstraction for accelflate
//!
//! This crate is the boundary between the codec and the hardware. It provides:
//!
//! - **Drivers**: [`AcceleratorDriver`] probes the work-queue topology and
//!   initializes one [`HardwareJob`] context per pool slot
//! - **Job protocol**: non-blocking `submit` / `check`, plus a blocking
//!   `execute`, over [`JobDescriptor`]s
//! - **Backends**: [`NullAccelerator`] for hosts without hardware and a
//!   deterministic [`SimulatedAccelerator`] with fault injection
//! - **Raw DEFLATE kernel**: [`DeflateContext`], shared by every tier
//! - **Discovery**: a read-only sysfs probe for idxd work queues (Unix only)
//!
//! # Features
//!
//! - `serde` (default): Enable serialization support for topology types
//!
//! # Examples
//!
//! ```rust
//! use accelflate_device::{AcceleratorDriver, SimulatedAccelerator};
//!
//! let driver = SimulatedAccelerator::with_capacity(4);
//! let topology = driver.probe()?;
//! assert_eq!(topology.total_queue_depth(), 4);
//! # Ok::<(), accelflate_types::Error>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod deflate;
pub mod driver;
pub mod job;
pub mod simulated;
pub mod topology;

#[cfg(unix)]
pub mod unix;

pub use deflate::DeflateContext;
pub use driver::{AcceleratorDriver, NullAccelerator};
pub use job::{status_codes, HardwareJob, JobDescriptor, JobFlags, JobStatus};
pub use simulated::{FaultInjector, SimulatedAccelerator, SimulatedConfig, SimulatedJob};
pub use topology::{AcceleratorDevice, Topology, WorkQueue};

#[cfg(unix)]
pub use unix::SysfsTopologyProbe;
