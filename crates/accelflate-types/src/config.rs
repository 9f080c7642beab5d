//! Configuration types for accelflate
//!
//! This module provides type-safe configuration values with validation
//! and serialization support.

/// DEFLATE compression level with validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Fastest compression
    pub const FASTEST: u8 = 1;
    /// Default compression
    pub const DEFAULT: u8 = 6;
    /// Best compression
    pub const BEST: u8 = 9;

    /// Create a new compression level with validation
    pub fn new(level: u8) -> Result<Self, String> {
        if level < Self::FASTEST {
            Err(format!(
                "Compression level {} is below minimum {}",
                level,
                Self::FASTEST
            ))
        } else if level > Self::BEST {
            Err(format!(
                "Compression level {} exceeds maximum {}",
                level,
                Self::BEST
            ))
        } else {
            Ok(Self(level))
        }
    }

    /// Get the compression level value
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, true)]
    #[case(6, true)]
    #[case(9, true)]
    #[case(0, false)]
    #[case(22, false)]
    fn test_level_bounds(#[case] level: u8, #[case] valid: bool) {
        assert_eq!(CompressionLevel::new(level).is_ok(), valid);
    }

    #[test]
    fn test_default_level() {
        assert_eq!(CompressionLevel::default().get(), CompressionLevel::DEFAULT);
    }
}
