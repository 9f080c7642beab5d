//! Software-emulated accelerator
//!
//! The simulated device behaves like a real work-queue accelerator from the
//! pool's point of view: jobs are submitted, stay "being processed" for a
//! configurable number of polls, then complete. The actual DEFLATE work runs
//! on the submitting thread through [`DeflateContext`], which makes completion
//! fully deterministic.
//!
//! A shared [`FaultInjector`] lets callers fail probes, job initialization,
//! submissions or completions to exercise every fallback path.

use crate::deflate::DeflateContext;
use crate::driver::AcceleratorDriver;
use crate::job::{status_codes, HardwareJob, JobDescriptor, JobStatus};
use crate::topology::Topology;
use accelflate_types::{CompressionLevel, Error, JobOperation, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Switches for failing simulated operations on demand
#[derive(Debug, Default)]
pub struct FaultInjector {
    probe_failure: AtomicBool,
    init_failures: AtomicUsize,
    submission_failures: AtomicUsize,
    completion_failures: AtomicUsize,
}

impl FaultInjector {
    /// Create an injector with no faults armed
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every probe fail (or succeed again)
    pub fn fail_probe(&self, fail: bool) {
        self.probe_failure.store(fail, Ordering::SeqCst);
    }

    /// Fail the next `count` job initializations
    pub fn fail_next_inits(&self, count: usize) {
        self.init_failures.store(count, Ordering::SeqCst);
    }

    /// Reject the next `count` submissions
    pub fn fail_next_submissions(&self, count: usize) {
        self.submission_failures.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` accepted jobs at completion time
    pub fn fail_next_completions(&self, count: usize) {
        self.completion_failures.store(count, Ordering::SeqCst);
    }

    /// Disarm every fault
    pub fn clear(&self) {
        self.fail_probe(false);
        self.fail_next_inits(0);
        self.fail_next_submissions(0);
        self.fail_next_completions(0);
    }

    fn probe_fails(&self) -> bool {
        self.probe_failure.load(Ordering::SeqCst)
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Shape of the simulated device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedConfig {
    /// Work-queue sizes; their sum is the pool capacity
    pub queue_depths: Vec<usize>,
    /// Number of `check` calls a job reports as in flight before completing
    pub completion_polls: u32,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            queue_depths: vec![8],
            completion_polls: 2,
        }
    }
}

/// Driver for the software-emulated accelerator
#[derive(Debug, Clone, Default)]
pub struct SimulatedAccelerator {
    config: SimulatedConfig,
    faults: Arc<FaultInjector>,
}

impl SimulatedAccelerator {
    /// Create a simulated accelerator with the given shape
    pub fn new(config: SimulatedConfig) -> Self {
        Self {
            config,
            faults: Arc::new(FaultInjector::new()),
        }
    }

    /// Simulated device with one work queue of `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(SimulatedConfig {
            queue_depths: vec![capacity],
            ..SimulatedConfig::default()
        })
    }

    /// Set how many polls a job stays in flight
    pub fn with_completion_polls(mut self, polls: u32) -> Self {
        self.config.completion_polls = polls;
        self
    }

    /// Shape of the device
    pub fn config(&self) -> &SimulatedConfig {
        &self.config
    }

    /// Fault switches shared with every job context of this device
    pub fn faults(&self) -> Arc<FaultInjector> {
        Arc::clone(&self.faults)
    }
}

impl AcceleratorDriver for SimulatedAccelerator {
    fn name(&self) -> &str {
        "simulated"
    }

    fn probe(&self) -> Result<Topology> {
        if self.faults.probe_fails() {
            return Err(Error::device_detection(
                "simulated accelerator configuration context unavailable",
            ));
        }
        Ok(Topology::single_device("sim0", &self.config.queue_depths))
    }

    fn init_job(&self, index: usize) -> Result<Box<dyn HardwareJob>> {
        if FaultInjector::take(&self.faults.init_failures) {
            return Err(Error::initialization(
                format!("hardware job {}", index),
                "simulated job initialization fault",
            ));
        }
        Ok(Box::new(SimulatedJob::new(
            index,
            self.config.completion_polls,
            Arc::clone(&self.faults),
        )))
    }
}

/// Job context of the simulated accelerator
#[derive(Debug)]
pub struct SimulatedJob {
    index: usize,
    completion_polls: u32,
    faults: Arc<FaultInjector>,
    context: Option<DeflateContext>,
    descriptor: Option<JobDescriptor>,
    output: Vec<u8>,
    remaining_polls: u32,
    outcome: JobStatus,
}

impl SimulatedJob {
    fn new(index: usize, completion_polls: u32, faults: Arc<FaultInjector>) -> Self {
        Self {
            index,
            completion_polls,
            faults,
            context: Some(DeflateContext::new(CompressionLevel::default())),
            descriptor: None,
            output: Vec::new(),
            remaining_polls: 0,
            outcome: JobStatus::Failed(status_codes::NO_JOB_SUBMITTED),
        }
    }

    fn run(context: &mut DeflateContext, descriptor: &JobDescriptor) -> (JobStatus, Vec<u8>) {
        let mut output = vec![0u8; descriptor.available_out];
        let result = match descriptor.operation {
            JobOperation::Compress => {
                context.set_level(descriptor.level);
                context.compress_into(&descriptor.input, &mut output)
            }
            JobOperation::Decompress => context.decompress_into(&descriptor.input, &mut output),
        };
        match result {
            Ok(produced) => {
                output.truncate(produced);
                (JobStatus::Success, output)
            }
            Err(code) => (JobStatus::Failed(code), Vec::new()),
        }
    }
}

impl HardwareJob for SimulatedJob {
    fn submit(&mut self, descriptor: JobDescriptor) -> JobStatus {
        let Some(context) = self.context.as_mut() else {
            return JobStatus::Failed(status_codes::JOB_FINALIZED);
        };
        if FaultInjector::take(&self.faults.submission_failures) {
            trace!(slot = self.index, "simulated submission fault");
            return JobStatus::Failed(status_codes::INJECTED_SUBMISSION_FAULT);
        }

        let (mut outcome, mut output) = Self::run(context, &descriptor);
        if outcome == JobStatus::Success && FaultInjector::take(&self.faults.completion_failures) {
            trace!(slot = self.index, "simulated completion fault");
            outcome = JobStatus::Failed(status_codes::INJECTED_COMPLETION_FAULT);
            output.clear();
        }

        self.outcome = outcome;
        self.output = output;
        self.remaining_polls = self.completion_polls;
        self.descriptor = Some(descriptor);
        JobStatus::Success
    }

    fn check(&mut self) -> JobStatus {
        if self.context.is_none() {
            return JobStatus::Failed(status_codes::JOB_FINALIZED);
        }
        if self.remaining_polls > 0 {
            self.remaining_polls -= 1;
            return JobStatus::BeingProcessed;
        }
        self.outcome
    }

    fn output(&self) -> &[u8] {
        &self.output
    }

    fn descriptor(&self) -> Option<&JobDescriptor> {
        self.descriptor.as_ref()
    }

    fn finalize(&mut self) {
        self.context = None;
        self.descriptor = None;
        self.output = Vec::new();
        self.outcome = JobStatus::Failed(status_codes::JOB_FINALIZED);
    }
}
