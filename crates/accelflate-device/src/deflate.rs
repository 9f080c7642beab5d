//! Raw DEFLATE kernel
//!
//! A reusable single-shot compression/decompression context writing straight
//! into caller-provided buffers. Both the simulated accelerator and the
//! software tier run their jobs through it, so every tier produces and accepts
//! the same raw DEFLATE streams (no zlib or gzip framing).

use crate::job::status_codes;
use accelflate_types::CompressionLevel;
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use std::fmt;

/// Reusable raw DEFLATE context
pub struct DeflateContext {
    level: CompressionLevel,
    compress: Compress,
    stored: Option<Compress>,
    decompress: Decompress,
}

impl DeflateContext {
    /// Create a context compressing at `level`
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            level,
            compress: Compress::new(Compression::new(u32::from(level.get())), false),
            stored: None,
            decompress: Decompress::new(false),
        }
    }

    /// Compression level of the context
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Switch the compression level, rebuilding the compressor if it changed
    pub fn set_level(&mut self, level: CompressionLevel) {
        if level != self.level {
            self.level = level;
            self.compress = Compress::new(Compression::new(u32::from(level.get())), false);
        }
    }

    /// Compress `source` into `dest` as one final block sequence
    ///
    /// Input the compressor expands past `dest` is written again as stored
    /// blocks, which stay within [`max_compressed_size`] for any input.
    ///
    /// Returns the number of bytes written or a status code from
    /// [`status_codes`].
    ///
    /// [`max_compressed_size`]: accelflate_types::max_compressed_size
    pub fn compress_into(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize, u32> {
        match Self::finish(&mut self.compress, source, dest) {
            Err(status_codes::MORE_OUTPUT_NEEDED) => {
                let stored = self
                    .stored
                    .get_or_insert_with(|| Compress::new(Compression::none(), false));
                Self::finish(stored, source, dest)
            }
            result => result,
        }
    }

    fn finish(compress: &mut Compress, source: &[u8], dest: &mut [u8]) -> Result<usize, u32> {
        compress.reset();
        match compress.compress(source, dest, FlushCompress::Finish) {
            Ok(Status::StreamEnd) => Ok(compress.total_out() as usize),
            Ok(Status::Ok | Status::BufError) => Err(status_codes::MORE_OUTPUT_NEEDED),
            Err(_) => Err(status_codes::BAD_STREAM),
        }
    }

    /// Decompress the complete stream in `source` into `dest`
    ///
    /// Returns the number of bytes produced or a status code from
    /// [`status_codes`].
    pub fn decompress_into(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize, u32> {
        self.decompress.reset(false);

        // inflate needs somewhere to write even when the stream is empty
        let mut scratch = [0u8; 1];
        let dest_len = dest.len();
        let out: &mut [u8] = if dest.is_empty() { &mut scratch } else { dest };
        let out_len = out.len();

        let status = self.decompress.decompress(source, out, FlushDecompress::Finish);
        let produced = self.decompress.total_out() as usize;
        match status {
            Ok(Status::StreamEnd) if produced <= dest_len => Ok(produced),
            Ok(Status::StreamEnd) => Err(status_codes::MORE_OUTPUT_NEEDED),
            Ok(Status::Ok | Status::BufError) if produced >= out_len => {
                Err(status_codes::MORE_OUTPUT_NEEDED)
            }
            Ok(Status::Ok | Status::BufError) => Err(status_codes::TRUNCATED_INPUT),
            Err(_) => Err(status_codes::BAD_STREAM),
        }
    }
}

impl fmt::Debug for DeflateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeflateContext")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}
