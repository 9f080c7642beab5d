//! Per-codec counters

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which tier served each call of one codec instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CodecStats {
    /// Compressions served by the accelerator
    pub hardware_compressions: u64,
    /// Compressions served in software
    pub software_compressions: u64,
    /// Synchronous decompressions served by the accelerator
    pub hardware_decompressions: u64,
    /// Decompressions accepted by the accelerator in asynchronous mode
    pub async_submissions: u64,
    /// Asynchronous jobs completed by the accelerator at flush time
    pub async_completions: u64,
    /// Asynchronous jobs redone in software at flush time
    pub async_corrections: u64,
    /// Decompressions served in software, excluding flush-time corrections
    pub software_decompressions: u64,
}

impl CodecStats {
    /// Calls answered by the accelerator
    pub fn hardware_total(&self) -> u64 {
        self.hardware_compressions + self.hardware_decompressions + self.async_completions
    }

    /// Calls answered in software
    pub fn software_total(&self) -> u64 {
        self.software_compressions + self.software_decompressions + self.async_corrections
    }

    /// Fraction of calls answered by the accelerator
    pub fn hardware_ratio(&self) -> f64 {
        let total = self.hardware_total() + self.software_total();
        if total == 0 {
            0.0
        } else {
            self.hardware_total() as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        let stats = CodecStats {
            hardware_compressions: 3,
            software_compressions: 1,
            ..CodecStats::default()
        };
        assert_eq!(stats.hardware_total(), 3);
        assert_eq!(stats.software_total(), 1);
        assert!((stats.hardware_ratio() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CodecStats::default().hardware_ratio(), 0.0);
    }
}
