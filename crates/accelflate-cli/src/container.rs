//! Block container used by the `compress` and `decompress` commands
//!
//! ```text
//! "AFL1"
//! repeated: method (u8) | compressed length (u32 LE) | uncompressed length (u32 LE) | payload
//! ```
//!
//! Payloads are the codec's raw output; the container adds nothing else.

use accelflate_codec::{DecompressTarget, DeflateAccelCodec};
use accelflate_types::{CodecMode, CompressionMethod};
use anyhow::{bail, ensure, Context, Result};

/// File magic
pub const MAGIC: &[u8; 4] = b"AFL1";

/// Bytes in front of every payload
pub const BLOCK_HEADER_LEN: usize = 9;

/// Default uncompressed block size
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Largest uncompressed block accepted when writing or reading a container
pub const MAX_BLOCK_SIZE: usize = 64 * 1024 * 1024;

/// One block as stored in a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFrame<'a> {
    /// Compression method of the payload
    pub method: CompressionMethod,
    /// Size of the block once decompressed
    pub uncompressed_len: usize,
    /// Compressed bytes
    pub payload: &'a [u8],
}

/// Compress `data` block by block into a container
///
/// `on_block` is called after each block with the number of input bytes
/// consumed so far.
pub fn compress_blocks<F>(
    codec: &mut DeflateAccelCodec,
    data: &[u8],
    block_size: usize,
    mut on_block: F,
) -> Result<Vec<u8>>
where
    F: FnMut(usize),
{
    ensure!(block_size > 0, "Block size must be greater than 0");
    ensure!(
        block_size <= MAX_BLOCK_SIZE,
        "Block size {} exceeds the maximum of {}",
        block_size,
        MAX_BLOCK_SIZE
    );

    let mut out = Vec::with_capacity(MAGIC.len() + data.len() / 2);
    out.extend_from_slice(MAGIC);

    let mut scratch = vec![0u8; codec.max_compressed_data_size(block_size)];
    let mut consumed = 0;
    for block in data.chunks(block_size) {
        let written = codec
            .compress_data(block, &mut scratch)
            .with_context(|| format!("Failed to compress block at offset {}", consumed))?;

        out.push(codec.method_byte());
        out.extend_from_slice(&(written as u32).to_le_bytes());
        out.extend_from_slice(&(block.len() as u32).to_le_bytes());
        out.extend_from_slice(&scratch[..written]);

        consumed += block.len();
        on_block(consumed);
    }
    Ok(out)
}

/// Split a container into its blocks
pub fn parse_blocks(container: &[u8]) -> Result<Vec<BlockFrame<'_>>> {
    let Some(mut rest) = container.strip_prefix(MAGIC.as_slice()) else {
        bail!("Not an accelflate container (bad magic)");
    };

    let mut frames = Vec::new();
    while !rest.is_empty() {
        ensure!(
            rest.len() >= BLOCK_HEADER_LEN,
            "Truncated block header after {} blocks",
            frames.len()
        );
        let method = CompressionMethod::from_byte(rest[0])
            .with_context(|| format!("Unknown compression method 0x{:02x}", rest[0]))?;
        let compressed_len = read_u32(&rest[1..5]);
        let uncompressed_len = read_u32(&rest[5..9]);
        ensure!(
            uncompressed_len <= MAX_BLOCK_SIZE,
            "Block {} claims {} uncompressed bytes, more than the maximum of {}",
            frames.len(),
            uncompressed_len,
            MAX_BLOCK_SIZE
        );
        rest = &rest[BLOCK_HEADER_LEN..];

        ensure!(
            rest.len() >= compressed_len,
            "Truncated payload in block {}",
            frames.len()
        );
        let (payload, tail) = rest.split_at(compressed_len);
        frames.push(BlockFrame {
            method,
            uncompressed_len,
            payload,
        });
        rest = tail;
    }
    Ok(frames)
}

/// Decompress every block of a container in `mode`
///
/// In asynchronous mode all blocks are submitted first and resolved by a
/// single flush.
pub fn decompress_blocks<F>(
    codec: &mut DeflateAccelCodec,
    container: &[u8],
    mode: CodecMode,
    mut on_block: F,
) -> Result<Vec<u8>>
where
    F: FnMut(usize),
{
    let frames = parse_blocks(container)?;
    codec.set_decompress_mode(mode);

    let mut targets = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        let target = DecompressTarget::new();
        codec
            .decompress_data(frame.payload, &target, frame.uncompressed_len)
            .with_context(|| format!("Failed to decompress block {}", index))?;
        targets.push(target);
        on_block(index + 1);
    }
    codec
        .flush_asynchronous_decompress_requests()
        .context("Failed to flush asynchronous decompression")?;

    let total = frames.iter().map(|frame| frame.uncompressed_len).sum();
    let mut out = Vec::with_capacity(total);
    for (index, (frame, target)) in frames.iter().zip(&targets).enumerate() {
        let block = target.take();
        ensure!(
            block.len() == frame.uncompressed_len,
            "Block {} decompressed to {} bytes, expected {}",
            index,
            block.len(),
            frame.uncompressed_len
        );
        out.extend_from_slice(&block);
    }
    Ok(out)
}

fn read_u32(bytes: &[u8]) -> usize {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    u32::from_le_bytes(raw) as usize
}
