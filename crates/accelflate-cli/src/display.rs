//! Terminal output helpers

use accelflate_codec::{CodecStats, PoolStats};
use accelflate_device::Topology;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Format a throughput for `bytes` processed in `elapsed`
pub fn format_throughput(bytes: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs <= f64::EPSILON {
        return "-".to_string();
    }
    format!("{}/s", format_bytes((bytes as f64 / secs) as u64))
}

/// Compressed size as a percentage of the original
pub fn format_ratio(original: u64, compressed: u64) -> String {
    if original == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", compressed as f64 * 100.0 / original as f64)
}

/// Display success message
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Display warning message
pub fn display_warning(message: &str) {
    println!("{} {}", style("⚠").yellow(), message);
}

/// Display info message
pub fn display_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}

/// Per-tier counters of a finished run
pub fn display_codec_stats(stats: &CodecStats) {
    println!("{}", style("Engine usage").bold());
    println!(
        "  Compress:    {} hardware, {} software",
        stats.hardware_compressions, stats.software_compressions
    );
    println!(
        "  Decompress:  {} hardware, {} software",
        stats.hardware_decompressions, stats.software_decompressions
    );
    if stats.async_submissions > 0 {
        println!(
            "  Async:       {} submitted, {} completed, {} corrected",
            stats.async_submissions, stats.async_completions, stats.async_corrections
        );
    }
    println!(
        "  Hardware share: {:.1}%",
        stats.hardware_ratio() * 100.0
    );
}

/// Job pool summary
pub fn display_pool(driver: &str, ready: bool, stats: &PoolStats) {
    let state = if ready {
        style("ready").green()
    } else {
        style("disabled").yellow()
    };
    println!(
        "{} driver {} ({}), {} slots, {} acquisitions, {} exhausted",
        style("Pool:").bold(),
        style(driver).cyan(),
        state,
        stats.capacity,
        stats.acquired,
        stats.exhausted
    );
}

/// Devices and work queues of a probe
pub fn display_topology(topology: &Topology) {
    if topology.is_empty() {
        display_warning("No accelerator devices found");
        return;
    }
    for device in &topology.devices {
        println!(
            "{} {} ({} queues, depth {})",
            style("Device").bold(),
            style(&device.name).cyan(),
            device.work_queues.len(),
            device.queue_depth()
        );
        for wq in &device.work_queues {
            println!("  {:<10} size {}", wq.name, wq.size);
        }
    }
    display_info(&format!(
        "{} work queues, {} job slots in total",
        topology.work_queue_count(),
        topology.total_queue_depth()
    ));
}

/// Progress bar over `len` bytes, hidden when `quiet`
pub fn create_progress_bar(len: u64, message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0 B")]
    #[case(512, "512 B")]
    #[case(1536, "1.50 KB")]
    #[case(1024 * 1024, "1.00 MB")]
    #[case(3 * 1024 * 1024 * 1024, "3.00 GB")]
    fn test_format_bytes(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_bytes(bytes), expected);
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(200, 50), "25.0%");
        assert_eq!(format_ratio(0, 10), "-");
    }

    #[test]
    fn test_format_throughput() {
        assert_eq!(format_throughput(2048, Duration::from_secs(1)), "2.00 KB/s");
        assert_eq!(format_throughput(2048, Duration::ZERO), "-");
    }
}
