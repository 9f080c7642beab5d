//! Core traits for accelflate operations
//!
//! The hardware and software tiers expose the same block operations so that
//! the codec can stay agnostic of which tier served a call.

use crate::{EngineTier, Result};

/// Single-shot DEFLATE block operations
pub trait BlockEngine {
    /// Compress `source` into `dest`, returning the number of bytes written
    ///
    /// Hardware engines report `Error::PoolExhausted` or
    /// `Error::HardwareExecution`, both recoverable by the software tier.
    fn compress_block(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize>;

    /// Decompress `source` into `dest`, returning the number of bytes produced
    fn decompress_block(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize>;

    /// Tier this engine belongs to
    fn tier(&self) -> EngineTier;
}
