//! Hardware tier
//!
//! Issues single-shot jobs on slots leased from the shared [`JobPool`]. Every
//! failure here is reported as a recoverable error and the slot is always
//! released first; retrying in software is the caller's business. The one
//! exception is the asynchronous path, where failures only surface during
//! [`HardwareEngine::flush`] and are corrected in place through the software
//! engine handed to it.

use crate::pool::{JobLease, JobPool};
use crate::registry::AsyncJobRegistry;
use crate::software::SoftwareEngine;
use crate::target::DecompressTarget;
use accelflate_device::{JobDescriptor, JobStatus};
use accelflate_types::{
    BlockEngine, CompressionLevel, EngineTier, Error, JobId, JobOperation, Result,
};
use bytes::Bytes;
use crossbeam::utils::Backoff;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Outcome of draining the asynchronous registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Jobs the accelerator completed successfully
    pub completed: usize,
    /// Jobs that failed and were redone in software
    pub corrected: usize,
}

/// Accelerator-backed DEFLATE engine
#[derive(Debug)]
pub struct HardwareEngine {
    pool: Arc<JobPool>,
    level: CompressionLevel,
    registry: AsyncJobRegistry,
}

impl HardwareEngine {
    /// Create an engine issuing jobs on `pool`
    pub fn new(pool: Arc<JobPool>, level: CompressionLevel) -> Self {
        let registry = AsyncJobRegistry::with_capacity(pool.capacity());
        Self {
            pool,
            level,
            registry,
        }
    }

    /// The pool this engine leases slots from
    pub fn pool(&self) -> &Arc<JobPool> {
        &self.pool
    }

    /// Number of accepted asynchronous jobs not yet flushed
    pub fn pending(&self) -> usize {
        self.registry.len()
    }

    /// Ids of accepted asynchronous jobs not yet flushed
    pub fn pending_ids(&self) -> Vec<JobId> {
        self.registry.ids()
    }

    /// Compress `source` into `dest` on a hardware slot
    pub fn compress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize> {
        let mut lease = self.pool.acquire()?;
        let descriptor =
            JobDescriptor::compress(Bytes::copy_from_slice(source), dest.len(), self.level);
        let status = lease.job_mut().execute(descriptor);
        let result = match status {
            JobStatus::Success => copy_output(&lease, dest, JobOperation::Compress),
            failed => Err(execution_failure(&lease, JobOperation::Compress, failed)),
        };
        self.pool.release(lease);
        result
    }

    /// Decompress `source` into `dest`, polling until the job completes
    pub fn decompress_synchronous(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize> {
        let mut lease = self.submit_decompress(source, dest.len())?;

        let backoff = Backoff::new();
        let status = loop {
            match lease.job_mut().check() {
                JobStatus::BeingProcessed => backoff.snooze(),
                terminal => break terminal,
            }
        };

        let result = match status {
            JobStatus::Success => copy_output(&lease, dest, JobOperation::Decompress),
            failed => Err(execution_failure(&lease, JobOperation::Decompress, failed)),
        };
        self.pool.release(lease);
        result
    }

    /// Submit a decompression and return without waiting
    ///
    /// `target` is filled by [`HardwareEngine::flush`].
    pub fn decompress_asynchronous(
        &mut self,
        source: &[u8],
        target: &DecompressTarget,
        uncompressed_size: usize,
    ) -> Result<JobId> {
        let lease = self.submit_decompress(source, uncompressed_size)?;
        target.mark_pending();
        let id = self.registry.insert(lease, target.clone());
        trace!(%id, uncompressed_size, "Asynchronous decompression accepted");
        Ok(id)
    }

    fn submit_decompress(&mut self, source: &[u8], available_out: usize) -> Result<JobLease> {
        let mut lease = self.pool.acquire()?;
        let descriptor = JobDescriptor::decompress(Bytes::copy_from_slice(source), available_out);
        match lease.job_mut().submit(descriptor) {
            JobStatus::Success => Ok(lease),
            rejected => {
                let error = execution_failure(&lease, JobOperation::Decompress, rejected);
                self.pool.release(lease);
                Err(error)
            }
        }
    }

    /// Drain every accepted asynchronous job
    ///
    /// Completed jobs copy their output into their target. Failed jobs are
    /// decompressed again from their original input through `software`. Every
    /// slot is released as soon as its job is resolved. Returns once the
    /// registry is empty, or with the first software failure, in which case
    /// the remaining jobs stay registered for a later flush.
    pub fn flush(&mut self, software: &mut SoftwareEngine) -> Result<FlushReport> {
        let mut report = FlushReport::default();
        let backoff = Backoff::new();

        while !self.registry.is_empty() {
            let mut progressed = false;

            for id in self.registry.ids() {
                let status = match self.registry.get_mut(id) {
                    Some(entry) => entry.lease.job_mut().check(),
                    None => continue,
                };
                if status == JobStatus::BeingProcessed {
                    continue;
                }
                let Some(entry) = self.registry.remove(id) else {
                    continue;
                };
                progressed = true;

                if status == JobStatus::Success {
                    entry.target.fill(entry.lease.job().output());
                    self.pool.release(entry.lease);
                    report.completed += 1;
                    continue;
                }

                let input = entry
                    .lease
                    .job()
                    .descriptor()
                    .map(|descriptor| (descriptor.input.clone(), descriptor.available_out));
                warn!(
                    %id,
                    code = status.code().unwrap_or_default(),
                    "Asynchronous hardware decompression failed, correcting in software"
                );
                self.pool.release(entry.lease);

                let (input, available_out) = input.ok_or_else(|| {
                    Error::decompression(format!("No job input recorded for {}", id))
                })?;
                entry
                    .target
                    .write_with(available_out, |buf| software.decompress(&input, buf))?;
                report.corrected += 1;
            }

            if progressed {
                backoff.reset();
            } else {
                backoff.snooze();
            }
        }

        if report.completed + report.corrected > 0 {
            debug!(
                completed = report.completed,
                corrected = report.corrected,
                "Asynchronous decompression requests flushed"
            );
        }
        Ok(report)
    }
}

impl BlockEngine for HardwareEngine {
    fn compress_block(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize> {
        self.compress(source, dest)
    }

    fn decompress_block(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize> {
        self.decompress_synchronous(source, dest)
    }

    fn tier(&self) -> EngineTier {
        EngineTier::Hardware
    }
}

impl Drop for HardwareEngine {
    fn drop(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        warn!(
            leaked = self.registry.len(),
            "Hardware engine dropped with unflushed asynchronous jobs, releasing their slots"
        );
        for entry in self.registry.drain() {
            self.pool.release(entry.lease);
        }
    }
}

fn copy_output(lease: &JobLease, dest: &mut [u8], operation: JobOperation) -> Result<usize> {
    let output = lease.job().output();
    if output.len() > dest.len() {
        warn!(slot = lease.index(), %operation, "Job output exceeds destination");
        return Err(Error::BufferTooSmall {
            required: output.len(),
            available: dest.len(),
        });
    }
    dest[..output.len()].copy_from_slice(output);
    Ok(output.len())
}

fn execution_failure(lease: &JobLease, operation: JobOperation, status: JobStatus) -> Error {
    let code = status.code().unwrap_or_default();
    warn!(
        slot = lease.index(),
        %operation,
        code,
        "Hardware job failed, falling back to software"
    );
    Error::HardwareExecution { operation, code }
}
