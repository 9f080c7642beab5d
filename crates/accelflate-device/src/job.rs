//! Hardware job descriptors and the job-context trait
//!
//! A hardware job is the opaque per-slot context an accelerator driver hands
//! out. The pool owns one per job slot and only the thread holding the slot
//! may touch it.

use accelflate_types::{CompressionLevel, JobOperation};
use bitflags::bitflags;
use bytes::Bytes;
use std::fmt;

/// Status codes reported inside [`JobStatus::Failed`]
pub mod status_codes {
    /// The destination buffer was too small for the produced output
    pub const MORE_OUTPUT_NEEDED: u32 = 1;
    /// The input was not a valid DEFLATE stream
    pub const BAD_STREAM: u32 = 2;
    /// The input ended before the final block
    pub const TRUNCATED_INPUT: u32 = 3;
    /// `check` was called on a job context with nothing submitted
    pub const NO_JOB_SUBMITTED: u32 = 4;
    /// The job context was used after `finalize`
    pub const JOB_FINALIZED: u32 = 5;
    /// Submission rejected by fault injection
    pub const INJECTED_SUBMISSION_FAULT: u32 = 100;
    /// Completion failed by fault injection
    pub const INJECTED_COMPLETION_FAULT: u32 = 101;
}

bitflags! {
    /// Job control flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct JobFlags: u32 {
        /// Input is the first fragment of the stream
        const FIRST = 0b0001;
        /// Input is the last fragment of the stream
        const LAST = 0b0010;
        /// Build a dynamic Huffman table for the block
        const DYNAMIC_HUFFMAN = 0b0100;
        /// Skip the post-compression verification pass
        const OMIT_VERIFY = 0b1000;
    }
}

impl JobFlags {
    /// Flags for a single-shot compression job
    pub const fn single_shot_compress() -> Self {
        Self::FIRST
            .union(Self::LAST)
            .union(Self::DYNAMIC_HUFFMAN)
            .union(Self::OMIT_VERIFY)
    }

    /// Flags for a single-shot decompression job
    pub const fn single_shot_decompress() -> Self {
        Self::FIRST.union(Self::LAST)
    }
}

/// Everything a job context needs to run one operation
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    /// Operation to perform
    pub operation: JobOperation,
    /// Control flags
    pub flags: JobFlags,
    /// Compression level (ignored for decompression)
    pub level: CompressionLevel,
    /// Input bytes
    pub input: Bytes,
    /// Maximum number of output bytes the job may produce
    pub available_out: usize,
}

impl JobDescriptor {
    /// Describe a single-shot compression of `input`
    pub fn compress(input: Bytes, available_out: usize, level: CompressionLevel) -> Self {
        Self {
            operation: JobOperation::Compress,
            flags: JobFlags::single_shot_compress(),
            level,
            input,
            available_out,
        }
    }

    /// Describe a single-shot decompression of `input`
    pub fn decompress(input: Bytes, available_out: usize) -> Self {
        Self {
            operation: JobOperation::Decompress,
            flags: JobFlags::single_shot_decompress(),
            level: CompressionLevel::default(),
            input,
            available_out,
        }
    }
}

/// Status of a job as reported by the accelerator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Submission accepted, or job completed successfully
    Success,
    /// Job is still in flight
    BeingProcessed,
    /// Job was rejected or completed with an error code
    Failed(u32),
}

impl JobStatus {
    /// Whether the status is final for the current job
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::BeingProcessed)
    }

    /// Error code, if the status is a failure
    pub fn code(self) -> Option<u32> {
        match self {
            Self::Failed(code) => Some(code),
            _ => None,
        }
    }
}

/// Per-slot hardware job context
pub trait HardwareJob: Send + fmt::Debug {
    /// Submit a job without waiting for completion
    ///
    /// Returns [`JobStatus::Success`] when the accelerator accepted the job.
    fn submit(&mut self, descriptor: JobDescriptor) -> JobStatus;

    /// Poll the submitted job once
    fn check(&mut self) -> JobStatus;

    /// Run a job to a terminal status on the calling thread
    fn execute(&mut self, descriptor: JobDescriptor) -> JobStatus {
        let status = self.submit(descriptor);
        if status != JobStatus::Success {
            return status;
        }
        loop {
            match self.check() {
                JobStatus::BeingProcessed => std::hint::spin_loop(),
                terminal => return terminal,
            }
        }
    }

    /// Bytes produced by the last successfully completed job
    fn output(&self) -> &[u8];

    /// Descriptor of the last submitted job
    fn descriptor(&self) -> Option<&JobDescriptor>;

    /// Release the resources held by the context
    fn finalize(&mut self);
}
