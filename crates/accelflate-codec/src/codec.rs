//! The DEFLATE_ACCEL codec
//!
//! Chooses the tier for every call. Hardware is tried first whenever the pool
//! is ready; a recoverable hardware error falls through to software exactly
//! once. Only software failures reach the caller.
//!
//! Decompression depends on the codec mode:
//!
//! | Mode               | Pool ready                         | Pool disabled |
//! |--------------------|------------------------------------|---------------|
//! | `Synchronous`      | hardware, poll to completion       | software      |
//! | `Asynchronous`     | hardware, completed at flush       | software      |
//! | `SoftwareFallback` | software                           | software      |
//!
//! In asynchronous mode a request the accelerator does not accept is served
//! by software before the call returns, so only accepted requests wait for
//! [`DeflateAccelCodec::flush_asynchronous_decompress_requests`].

use crate::hardware::HardwareEngine;
use crate::pool::{JobPool, PoolStats};
use crate::software::SoftwareEngine;
use crate::stats::CodecStats;
use crate::target::DecompressTarget;
use accelflate_config::CodecConfig;
use accelflate_types::{
    max_compressed_size, BlockEngine, CodecMode, CompressionLevel, CompressionMethod, EngineTier,
    Error, JobId, Result, CODEC_NAME,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// Accelerator-backed DEFLATE codec with software fallback
///
/// One instance per thread; instances share the [`JobPool`].
#[derive(Debug)]
pub struct DeflateAccelCodec {
    pool: Arc<JobPool>,
    hardware: HardwareEngine,
    software: SoftwareEngine,
    mode: CodecMode,
    stats: CodecStats,
}

impl DeflateAccelCodec {
    /// Codec on `pool` with the default compression level
    pub fn new(pool: Arc<JobPool>) -> Self {
        Self::with_level(pool, CompressionLevel::default())
    }

    /// Codec on `pool` compressing at `level`
    pub fn with_level(pool: Arc<JobPool>, level: CompressionLevel) -> Self {
        Self {
            hardware: HardwareEngine::new(Arc::clone(&pool), level),
            software: SoftwareEngine::new(level),
            pool,
            mode: CodecMode::Synchronous,
            stats: CodecStats::default(),
        }
    }

    /// Codec on `pool` set up from configuration
    pub fn from_config(pool: Arc<JobPool>, config: &CodecConfig) -> Self {
        let mut codec = Self::with_level(pool, config.level);
        codec.mode = config.decompress_mode;
        codec
    }

    /// Codec on the process-wide pool
    pub fn from_global() -> Self {
        Self::new(JobPool::global())
    }

    /// Registered codec name
    pub fn name(&self) -> &'static str {
        CODEC_NAME
    }

    /// Registered compression method
    pub fn method(&self) -> CompressionMethod {
        CompressionMethod::DeflateAccel
    }

    /// Method byte stored in front of compressed blocks
    pub fn method_byte(&self) -> u8 {
        self.method().method_byte()
    }

    /// Worst-case compressed size for `uncompressed_size` bytes
    pub fn max_compressed_data_size(&self, uncompressed_size: usize) -> usize {
        max_compressed_size(uncompressed_size)
    }

    /// Compress `source` into `dest`, returning the compressed size
    ///
    /// `dest` must hold at least
    /// [`max_compressed_data_size`](Self::max_compressed_data_size) bytes.
    pub fn compress_data(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize> {
        let required = max_compressed_size(source.len());
        if dest.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                available: dest.len(),
            });
        }

        let use_hardware = self.pool.is_ready();
        let (written, tier) =
            self.run_tiered(use_hardware, |engine| engine.compress_block(source, dest))?;
        match tier {
            EngineTier::Hardware => self.stats.hardware_compressions += 1,
            EngineTier::Software => self.stats.software_compressions += 1,
        }
        trace!(?tier, input = source.len(), output = written, "Block compressed");
        Ok(written)
    }

    /// Compress `source` into a new buffer
    pub fn compress(&mut self, source: &[u8]) -> Result<Vec<u8>> {
        let mut dest = vec![0u8; max_compressed_size(source.len())];
        let written = self.compress_data(source, &mut dest)?;
        dest.truncate(written);
        Ok(dest)
    }

    /// Decompress `source` into `target` according to the current mode
    ///
    /// In asynchronous mode `target` may only be complete after the next
    /// flush; see [`DecompressTarget::is_pending`].
    pub fn decompress_data(
        &mut self,
        source: &[u8],
        target: &DecompressTarget,
        uncompressed_size: usize,
    ) -> Result<()> {
        let use_hardware = self.pool.is_ready();
        match self.mode {
            CodecMode::Synchronous => {
                let mut tier = EngineTier::Software;
                target.write_with(uncompressed_size, |buf| {
                    let (produced, served) = self.run_tiered(use_hardware, |engine| {
                        engine.decompress_block(source, buf)
                    })?;
                    tier = served;
                    Ok(produced)
                })?;
                match tier {
                    EngineTier::Hardware => self.stats.hardware_decompressions += 1,
                    EngineTier::Software => self.stats.software_decompressions += 1,
                }
                Ok(())
            }
            CodecMode::Asynchronous => {
                if use_hardware {
                    match self
                        .hardware
                        .decompress_asynchronous(source, target, uncompressed_size)
                    {
                        Ok(_) => {
                            self.stats.async_submissions += 1;
                            return Ok(());
                        }
                        Err(e) if e.is_recoverable() => {
                            debug!("Asynchronous submission not accepted, decompressing in software: {}", e);
                        }
                        Err(e) => return Err(e),
                    }
                }
                self.decompress_in_software(source, target, uncompressed_size)
            }
            CodecMode::SoftwareFallback => {
                self.decompress_in_software(source, target, uncompressed_size)
            }
        }
    }

    /// Decompress `source` into a new buffer
    ///
    /// Rejected while the codec is in asynchronous mode, where results are
    /// only available after a flush; use
    /// [`decompress_data`](Self::decompress_data) there.
    pub fn decompress(&mut self, source: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
        if self.mode == CodecMode::Asynchronous {
            return Err(Error::other(
                "Immediate decompression requested while asynchronous mode is active",
            ));
        }
        let target = DecompressTarget::new();
        self.decompress_data(source, &target, uncompressed_size)?;
        Ok(target.take())
    }

    /// Switch the decompression mode
    pub fn set_decompress_mode(&mut self, mode: CodecMode) {
        debug!(from = %self.mode, to = %mode, "Decompression mode changed");
        self.mode = mode;
    }

    /// Current decompression mode
    pub fn decompress_mode(&self) -> CodecMode {
        self.mode
    }

    /// Resolve every accepted asynchronous request and return to synchronous
    /// mode
    ///
    /// The mode is reset even when a software correction fails.
    pub fn flush_asynchronous_decompress_requests(&mut self) -> Result<()> {
        let result = if self.pool.is_ready() || self.hardware.pending() > 0 {
            self.hardware.flush(&mut self.software).map(|report| {
                self.stats.async_completions += report.completed as u64;
                self.stats.async_corrections += report.corrected as u64;
            })
        } else {
            Ok(())
        };
        self.mode = CodecMode::Synchronous;
        result
    }

    /// Ids of accepted asynchronous requests awaiting a flush
    pub fn pending_requests(&self) -> Vec<JobId> {
        self.hardware.pending_ids()
    }

    /// Counters of this codec instance
    pub fn stats(&self) -> CodecStats {
        self.stats
    }

    /// Counters of the shared pool
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Whether calls can reach the accelerator
    pub fn hardware_available(&self) -> bool {
        self.pool.is_ready()
    }

    fn decompress_in_software(
        &mut self,
        source: &[u8],
        target: &DecompressTarget,
        uncompressed_size: usize,
    ) -> Result<()> {
        let software = &mut self.software;
        target.write_with(uncompressed_size, |buf| software.decompress(source, buf))?;
        self.stats.software_decompressions += 1;
        Ok(())
    }

    /// Run `op` on the hardware tier, then once on software if that failed
    /// recoverably
    fn run_tiered<F>(&mut self, use_hardware: bool, mut op: F) -> Result<(usize, EngineTier)>
    where
        F: FnMut(&mut dyn BlockEngine) -> Result<usize>,
    {
        if use_hardware {
            match op(&mut self.hardware) {
                Ok(produced) => return Ok((produced, EngineTier::Hardware)),
                Err(e) if e.is_recoverable() => {
                    debug!("Hardware tier unavailable, retrying in software: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
        op(&mut self.software).map(|produced| (produced, EngineTier::Software))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accelflate_device::SimulatedAccelerator;
    use accelflate_types::ErrorKind;
    use proptest::prelude::*;
    use rstest::rstest;

    fn simulated_codec(capacity: usize) -> (SimulatedAccelerator, DeflateAccelCodec) {
        let driver = SimulatedAccelerator::with_capacity(capacity);
        let codec = DeflateAccelCodec::new(JobPool::shared(&driver));
        (driver, codec)
    }

    #[test]
    fn test_registration_constants() {
        let (_, codec) = simulated_codec(1);
        assert_eq!(codec.name(), "DEFLATE_ACCEL");
        assert_eq!(codec.method_byte(), 0x99);
        assert_eq!(codec.max_compressed_data_size(0), 13);
    }

    #[rstest]
    #[case(CodecMode::Synchronous)]
    #[case(CodecMode::SoftwareFallback)]
    fn test_round_trip_in_mode(#[case] mode: CodecMode) {
        let (_, mut codec) = simulated_codec(2);
        codec.set_decompress_mode(mode);
        let data = b"mode round trip ".repeat(64);

        let compressed = codec.compress(&data).unwrap();
        assert_eq!(codec.decompress(&compressed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_tiers_are_counted() {
        let (_, mut codec) = simulated_codec(2);
        let data = b"counted".repeat(20);
        let compressed = codec.compress(&data).unwrap();
        codec.decompress(&compressed, data.len()).unwrap();
        codec.set_decompress_mode(CodecMode::SoftwareFallback);
        codec.decompress(&compressed, data.len()).unwrap();

        let stats = codec.stats();
        assert_eq!(stats.hardware_compressions, 1);
        assert_eq!(stats.hardware_decompressions, 1);
        assert_eq!(stats.software_decompressions, 1);
        assert_eq!(codec.pool_stats().acquired, 2);
    }

    #[test]
    fn test_disabled_pool_goes_straight_to_software() {
        let mut codec = DeflateAccelCodec::new(Arc::new(JobPool::disabled()));
        assert!(!codec.hardware_available());
        let data = b"no accelerator".repeat(10);
        let compressed = codec.compress(&data).unwrap();
        assert_eq!(codec.decompress(&compressed, data.len()).unwrap(), data);

        let stats = codec.stats();
        assert_eq!(stats.software_compressions, 1);
        assert_eq!(stats.software_decompressions, 1);
        assert_eq!(codec.pool_stats().exhausted, 0);
    }

    #[test]
    fn test_hardware_failure_falls_through_once() {
        let (driver, mut codec) = simulated_codec(1);
        driver.faults().fail_next_completions(1);
        let data = b"fallback".repeat(30);

        let compressed = codec.compress(&data).unwrap();
        assert_eq!(codec.stats().software_compressions, 1);
        assert_eq!(codec.stats().hardware_compressions, 0);
        assert_eq!(codec.decompress(&compressed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_undersized_destination_is_rejected() {
        let (_, mut codec) = simulated_codec(1);
        let mut dest = [0u8; 8];
        let err = codec.compress_data(&[1u8; 64], &mut dest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
    }

    #[test]
    fn test_corrupt_input_is_fatal() {
        let (_, mut codec) = simulated_codec(1);
        let err = codec.decompress(&[0xFF; 32], 64).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decompression);
    }

    #[test]
    fn test_immediate_decompress_rejected_in_async_mode() {
        let (_, mut codec) = simulated_codec(1);
        codec.set_decompress_mode(CodecMode::Asynchronous);
        assert!(codec.decompress(&[], 0).is_err());
        codec.flush_asynchronous_decompress_requests().unwrap();
        assert_eq!(codec.decompress_mode(), CodecMode::Synchronous);
    }

    #[test]
    fn test_from_config() {
        let (driver, _) = simulated_codec(1);
        let config = CodecConfig {
            level: CompressionLevel::new(CompressionLevel::BEST).unwrap(),
            decompress_mode: CodecMode::SoftwareFallback,
        };
        let codec = DeflateAccelCodec::from_config(JobPool::shared(&driver), &config);
        assert_eq!(codec.decompress_mode(), CodecMode::SoftwareFallback);
    }

    fn inflate_independently(compressed: &[u8]) -> Vec<u8> {
        use std::io::Read;
        let mut restored = Vec::new();
        flate2::read::DeflateDecoder::new(compressed)
            .read_to_end(&mut restored)
            .unwrap();
        restored
    }

    #[rstest]
    fn test_output_is_standard_raw_deflate(
        #[values(1, 6, 9)] level: u8,
        #[values(true, false)] hardware: bool,
    ) {
        let pool = if hardware {
            JobPool::shared(&SimulatedAccelerator::with_capacity(1))
        } else {
            Arc::new(JobPool::disabled())
        };
        let mut codec = DeflateAccelCodec::with_level(pool, CompressionLevel::new(level).unwrap());

        let mut seed = 0x2545_F491_4F6C_DD1Du64;
        let mut data = b"standard stream ".repeat(2000);
        data.extend((0..70_000).map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed as u8
        }));

        let compressed = codec.compress(&data).unwrap();
        assert!(compressed.len() <= codec.max_compressed_data_size(data.len()));
        assert_eq!(inflate_independently(&compressed), data);

        let stats = codec.stats();
        assert_eq!(stats.hardware_compressions, u64::from(hardware));
        assert_eq!(stats.software_compressions, u64::from(!hardware));
    }

    proptest! {
        #[test]
        fn test_round_trip_any_input(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let (_, mut codec) = simulated_codec(2);
            let compressed = codec.compress(&data).unwrap();
            prop_assert_eq!(codec.decompress(&compressed, data.len()).unwrap(), data);
        }
    }
}
