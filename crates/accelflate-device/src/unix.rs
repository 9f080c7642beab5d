//! Linux sysfs work-queue discovery
//!
//! The idxd kernel driver exposes accelerator devices and their work queues
//! under `/sys/bus/dsa/devices`. Analytics accelerators appear as `iaxN`, their
//! queues as `wqN.M` with a `size` and a `state` attribute. This probe only
//! reads that tree; it never configures anything.

use crate::topology::{AcceleratorDevice, Topology, WorkQueue};
use accelflate_types::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default sysfs mount point
pub const DEFAULT_SYSFS_ROOT: &str = "/sys";

const DEVICE_PREFIX: &str = "iax";

/// Read-only topology probe over a sysfs tree
#[derive(Debug, Clone)]
pub struct SysfsTopologyProbe {
    root: PathBuf,
}

impl Default for SysfsTopologyProbe {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_ROOT)
    }
}

impl SysfsTopologyProbe {
    /// Probe rooted at `root` (normally `/sys`)
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the idxd devices
    pub fn devices_dir(&self) -> PathBuf {
        self.root.join("bus").join("dsa").join("devices")
    }

    /// Enumerate enabled work queues, grouped by device
    pub fn probe(&self) -> Result<Topology> {
        let dir = self.devices_dir();
        debug!("Probing accelerator work queues under {}", dir.display());

        let entries = fs::read_dir(&dir).map_err(|e| {
            Error::device_detection(format!("Failed to read {}: {}", dir.display(), e))
        })?;

        let mut devices: BTreeMap<u32, AcceleratorDevice> = BTreeMap::new();
        let mut queues: Vec<(u32, u32, PathBuf, String)> = Vec::new();

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(id) = parse_device_name(&name) {
                devices.insert(
                    id,
                    AcceleratorDevice {
                        name,
                        work_queues: Vec::new(),
                    },
                );
            } else if let Some((device, queue)) = parse_queue_name(&name) {
                queues.push((device, queue, entry.path(), name));
            }
        }

        queues.sort_by_key(|(device, queue, _, _)| (*device, *queue));
        for (device_id, _, path, name) in queues {
            let Some(device) = devices.get_mut(&device_id) else {
                continue;
            };
            if !is_enabled(&path) {
                debug!("Skipping disabled work queue {}", name);
                continue;
            }
            match read_size(&path) {
                Some(size) if size > 0 => device.work_queues.push(WorkQueue { name, size }),
                Some(_) => debug!("Skipping zero-sized work queue {}", name),
                None => warn!("Unreadable size attribute for work queue {}", name),
            }
        }

        let devices = devices
            .into_values()
            .filter(|device| !device.work_queues.is_empty())
            .collect();
        Ok(Topology { devices })
    }
}

fn parse_device_name(name: &str) -> Option<u32> {
    name.strip_prefix(DEVICE_PREFIX)?.parse().ok()
}

fn parse_queue_name(name: &str) -> Option<(u32, u32)> {
    let (device, queue) = name.strip_prefix("wq")?.split_once('.')?;
    Some((device.parse().ok()?, queue.parse().ok()?))
}

fn is_enabled(queue_dir: &Path) -> bool {
    // kernels without a state attribute only list configured queues
    match fs::read_to_string(queue_dir.join("state")) {
        Ok(state) => state.trim() == "enabled",
        Err(_) => true,
    }
}

fn read_size(queue_dir: &Path) -> Option<usize> {
    fs::read_to_string(queue_dir.join("size"))
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn write_queue(devices: &Path, name: &str, size: &str, state: Option<&str>) {
        let dir = devices.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("size"), size).unwrap();
        if let Some(state) = state {
            fs::write(dir.join("state"), state).unwrap();
        }
    }

    fn fake_sysfs() -> (TempDir, SysfsTopologyProbe) {
        let root = TempDir::new().unwrap();
        let probe = SysfsTopologyProbe::new(root.path());
        fs::create_dir_all(probe.devices_dir()).unwrap();
        (root, probe)
    }

    #[test]
    fn test_groups_enabled_queues_by_device() {
        let (_root, probe) = fake_sysfs();
        let devices = probe.devices_dir();
        fs::create_dir(devices.join("iax1")).unwrap();
        fs::create_dir(devices.join("iax3")).unwrap();
        fs::create_dir(devices.join("dsa0")).unwrap();
        write_queue(&devices, "wq1.0", "16\n", Some("enabled\n"));
        write_queue(&devices, "wq1.1", "8\n", Some("disabled\n"));
        write_queue(&devices, "wq3.0", "32\n", None);
        write_queue(&devices, "wq0.0", "64\n", Some("enabled\n"));

        let topology = probe.probe().unwrap();
        assert_eq!(topology.devices.len(), 2);
        assert_eq!(topology.devices[0].name, "iax1");
        assert_eq!(topology.devices[0].work_queues.len(), 1);
        assert_eq!(topology.total_queue_depth(), 48);
    }

    #[test]
    fn test_missing_tree_is_a_detection_error() {
        let root = TempDir::new().unwrap();
        let probe = SysfsTopologyProbe::new(root.path());
        let err = probe.probe().unwrap_err();
        assert_eq!(err.kind(), accelflate_types::ErrorKind::DeviceDetection);
    }

    #[test]
    fn test_unparsable_size_is_skipped() {
        let (_root, probe) = fake_sysfs();
        let devices = probe.devices_dir();
        fs::create_dir(devices.join("iax1")).unwrap();
        write_queue(&devices, "wq1.0", "lots", Some("enabled"));
        assert!(probe.probe().unwrap().is_empty());
    }

    #[rstest]
    #[case("wq1.0", Some((1, 0)))]
    #[case("wq12.7", Some((12, 7)))]
    #[case("wq1", None)]
    #[case("engine1.0", None)]
    fn test_parse_queue_name(#[case] name: &str, #[case] expected: Option<(u32, u32)>) {
        assert_eq!(parse_queue_name(name), expected);
    }
}
