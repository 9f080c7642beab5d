//! Accelerator topology as reported by a driver probe

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One hardware work queue
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorkQueue {
    /// Queue name, e.g. `wq1.0`
    pub name: String,
    /// Number of jobs the queue accepts concurrently
    pub size: usize,
}

/// One accelerator device and its configured work queues
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AcceleratorDevice {
    /// Device name, e.g. `iax1`
    pub name: String,
    /// Work queues configured on the device
    pub work_queues: Vec<WorkQueue>,
}

impl AcceleratorDevice {
    /// Sum of the device's work-queue sizes
    pub fn queue_depth(&self) -> usize {
        self.work_queues.iter().map(|wq| wq.size).sum()
    }
}

/// Accelerator devices visible to the process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Topology {
    /// Discovered devices
    pub devices: Vec<AcceleratorDevice>,
}

impl Topology {
    /// Topology with a single device exposing the given queue sizes
    pub fn single_device<S: Into<String>>(name: S, queue_sizes: &[usize]) -> Self {
        let name = name.into();
        let index = name
            .trim_start_matches(|c: char| !c.is_ascii_digit())
            .to_string();
        let work_queues = queue_sizes
            .iter()
            .enumerate()
            .map(|(queue, &size)| WorkQueue {
                name: format!("wq{}.{}", index, queue),
                size,
            })
            .collect();
        Self {
            devices: vec![AcceleratorDevice { name, work_queues }],
        }
    }

    /// Total number of concurrently usable job slots
    pub fn total_queue_depth(&self) -> usize {
        self.devices.iter().map(AcceleratorDevice::queue_depth).sum()
    }

    /// Number of work queues across all devices
    pub fn work_queue_count(&self) -> usize {
        self.devices.iter().map(|d| d.work_queues.len()).sum()
    }

    /// Whether no device was discovered
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_queue_depth_sums_all_devices() {
        let mut topology = Topology::single_device("iax1", &[16, 8]);
        topology
            .devices
            .extend(Topology::single_device("iax3", &[32]).devices);

        assert_eq!(topology.total_queue_depth(), 56);
        assert_eq!(topology.work_queue_count(), 3);
        assert_eq!(topology.devices[0].work_queues[1].name, "wq1.1");
    }

    #[test]
    fn test_empty_topology() {
        let topology = Topology::default();
        assert!(topology.is_empty());
        assert_eq!(topology.total_queue_depth(), 0);
    }
}
