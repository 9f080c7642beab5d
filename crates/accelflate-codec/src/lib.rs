//! Accelerator-backed DEFLATE codec for accelflate
//!
//! This crate turns a fixed pool of accelerator job slots into a block codec
//! that always produces correct output. It includes:
//!
//! - **Job pool**: lock-free slot acquisition over atomic flags, bounded
//!   probing, explicit release and teardown
//! - **Hardware tier**: single-shot compression, polled synchronous
//!   decompression and deferred asynchronous decompression with a flush that
//!   corrects failed jobs in software
//! - **Software tier**: a lazily created DEFLATE context, the fallback of last
//!   resort
//! - **Codec**: per-call tier selection, decompression modes and counters
//!
//! # Features
//!
//! - `serde` (default): Enable serialization support for statistics
//!
//! # Examples
//!
//! ```rust
//! use accelflate_codec::{DecompressTarget, DeflateAccelCodec, JobPool};
//! use accelflate_device::SimulatedAccelerator;
//! use accelflate_types::CodecMode;
//!
//! let pool = JobPool::shared(&SimulatedAccelerator::with_capacity(4));
//! let mut codec = DeflateAccelCodec::new(pool);
//!
//! let data = b"Hello, world! This is test data for compression.";
//! let compressed = codec.compress(data)?;
//!
//! codec.set_decompress_mode(CodecMode::Asynchronous);
//! let target = DecompressTarget::new();
//! codec.decompress_data(&compressed, &target, data.len())?;
//! codec.flush_asynchronous_decompress_requests()?;
//!
//! assert_eq!(target.to_vec(), data);
//! assert_eq!(codec.decompress_mode(), CodecMode::Synchronous);
//! # Ok::<(), accelflate_types::Error>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bootstrap;
pub mod codec;
pub mod hardware;
pub mod pool;
pub mod registry;
pub mod software;
pub mod stats;
pub mod target;


// Re-export main types
pub use bootstrap::{codec_from_config, driver_from_config, install_global_pool};
pub use codec::DeflateAccelCodec;
pub use hardware::{FlushReport, HardwareEngine};
pub use pool::{JobLease, JobPool, PoolStats};
pub use registry::{AsyncJobRegistry, PendingDecompression};
pub use software::SoftwareEngine;
pub use stats::CodecStats;
pub use target::DecompressTarget;
