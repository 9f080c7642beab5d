//! Core data types for accelflate
//!
//! This module provides the codec mode state, the registered compression
//! method identifier, job identifiers and the compressed-size bound shared by
//! every tier.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name under which the codec is registered
pub const CODEC_NAME: &str = "DEFLATE_ACCEL";

/// Worst-case compressed size for `uncompressed_size` input bytes
///
/// Aligned with zlib's generic deflate bound so that any destination buffer of
/// this size can hold the output of either tier.
pub const fn max_compressed_size(uncompressed_size: usize) -> usize {
    uncompressed_size
        + (uncompressed_size >> 12)
        + (uncompressed_size >> 14)
        + (uncompressed_size >> 25)
        + 13
}

/// Decompression mode of a codec instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CodecMode {
    /// Hardware decompression, caller blocks until the job completes
    #[default]
    Synchronous,
    /// Hardware decompression, completion is observed at flush time
    Asynchronous,
    /// Software decompression only
    SoftwareFallback,
}

impl fmt::Display for CodecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Synchronous => "synchronous",
            Self::Asynchronous => "asynchronous",
            Self::SoftwareFallback => "software-fallback",
        };
        f.write_str(name)
    }
}

impl FromStr for CodecMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sync" | "synchronous" => Ok(Self::Synchronous),
            "async" | "asynchronous" => Ok(Self::Asynchronous),
            "software" | "software-fallback" | "softwarefallback" => Ok(Self::SoftwareFallback),
            other => Err(format!("Unknown decompress mode: {}", other)),
        }
    }
}

/// Compression method identifiers known to the codec registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum CompressionMethod {
    /// Accelerator-backed DEFLATE with software fallback
    DeflateAccel = 0x99,
}

impl CompressionMethod {
    /// One-byte method identifier stored in front of compressed blocks
    pub const fn method_byte(self) -> u8 {
        self as u8
    }

    /// Resolve a method byte read from storage
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x99 => Some(Self::DeflateAccel),
            _ => None,
        }
    }
}

/// Operation carried by a hardware or software job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JobOperation {
    /// DEFLATE compression
    Compress,
    /// DEFLATE decompression
    Decompress,
}

impl fmt::Display for JobOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compress => f.write_str("compress"),
            Self::Decompress => f.write_str("decompress"),
        }
    }
}

/// Identifier of an accepted asynchronous hardware job
///
/// The id is the index of the job slot holding the job, so it is unique among
/// in-flight jobs of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JobId(usize);

impl JobId {
    /// Create a job id for the given slot index
    pub const fn from_slot(index: usize) -> Self {
        Self(index)
    }

    /// Slot index backing this job
    pub const fn slot(self) -> usize {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// Tier that served a block operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EngineTier {
    /// Accelerator job slot
    Hardware,
    /// Software job context
    Software,
}
