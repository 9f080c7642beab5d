//! Software tier
//!
//! The fallback of last resort. It owns a single DEFLATE context created on
//! first use and is driven by one thread at a time, the one holding the codec.
//! Its failures are fatal: nothing sits behind it.

use accelflate_device::DeflateContext;
use accelflate_types::{BlockEngine, CompressionLevel, EngineTier, Error, Result};
use tracing::trace;

/// Software DEFLATE engine
#[derive(Debug)]
pub struct SoftwareEngine {
    level: CompressionLevel,
    context: Option<DeflateContext>,
}

impl SoftwareEngine {
    /// Create an engine compressing at `level`
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            level,
            context: None,
        }
    }

    /// Compression level of the engine
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Whether the job context has been created yet
    pub fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    fn context(&mut self) -> &mut DeflateContext {
        let level = self.level;
        self.context.get_or_insert_with(|| {
            trace!(level = level.get(), "Creating software job context");
            DeflateContext::new(level)
        })
    }

    /// Compress `source` into `dest`, returning the compressed size
    pub fn compress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize> {
        self.context().compress_into(source, dest).map_err(|code| {
            Error::compression(format!(
                "Software compression of {} bytes failed with status code {}",
                source.len(),
                code
            ))
        })
    }

    /// Decompress `source` into `dest`, returning the decompressed size
    pub fn decompress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize> {
        self.context().decompress_into(source, dest).map_err(|code| {
            Error::decompression(format!(
                "Software decompression of {} bytes failed with status code {}",
                source.len(),
                code
            ))
        })
    }
}

impl Default for SoftwareEngine {
    fn default() -> Self {
        Self::new(CompressionLevel::default())
    }
}

impl BlockEngine for SoftwareEngine {
    fn compress_block(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize> {
        self.compress(source, dest)
    }

    fn decompress_block(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize> {
        self.decompress(source, dest)
    }

    fn tier(&self) -> EngineTier {
        EngineTier::Software
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accelflate_types::{max_compressed_size, ErrorKind};

    #[test]
    fn test_context_is_created_lazily() {
        let mut engine = SoftwareEngine::default();
        assert!(!engine.is_initialized());

        let mut dest = vec![0u8; max_compressed_size(5)];
        engine.compress(b"hello", &mut dest).unwrap();
        assert!(engine.is_initialized());
        assert_eq!(engine.tier(), EngineTier::Software);
    }

    #[test]
    fn test_round_trip() {
        let mut engine = SoftwareEngine::new(CompressionLevel::new(9).unwrap());
        let data = b"software tier round trip ".repeat(40);

        let mut compressed = vec![0u8; max_compressed_size(data.len())];
        let written = engine.compress(&data, &mut compressed).unwrap();

        let mut restored = vec![0u8; data.len()];
        let produced = engine
            .decompress(&compressed[..written], &mut restored)
            .unwrap();
        assert_eq!(produced, data.len());
        assert_eq!(restored, data);
    }

    #[test]
    fn test_failures_are_fatal() {
        let mut engine = SoftwareEngine::default();

        let mut tiny = [0u8; 1];
        let err = engine.compress(&[7u8; 1024], &mut tiny).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Compression);
        assert!(!err.is_recoverable());

        let mut dest = vec![0u8; 64];
        let err = engine.decompress(&[0xFF; 16], &mut dest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decompression);
        assert!(!err.is_recoverable());
    }
}
