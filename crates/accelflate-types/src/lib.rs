//! Core type system and error handling for accelflate
//!
//! This crate provides the foundational types, error handling, and shared data structures
//! used by the accelerator-backed DEFLATE codec. It includes:
//!
//! - **Error handling**: An error taxonomy that separates recoverable hardware-tier failures
//!   from fatal software-tier failures
//! - **Core types**: Codec modes, compression method identifiers and job identifiers
//! - **Traits**: The block engine capability shared by the hardware and software tiers
//! - **Configuration**: Validated compression level
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use accelflate_types::{CodecMode, Error, Result};
//!
//! fn pick_mode(hardware_trusted: bool) -> Result<CodecMode> {
//!     if hardware_trusted {
//!         Ok(CodecMode::Asynchronous)
//!     } else {
//!         Ok(CodecMode::SoftwareFallback)
//!     }
//! }
//!
//! assert_eq!(pick_mode(false).unwrap(), CodecMode::SoftwareFallback);
//! assert!(Error::PoolExhausted { capacity: 4 }.is_recoverable());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::CompressionLevel;
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
pub use traits::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_compressed_size_bound() {
        assert_eq!(max_compressed_size(0), 13);
        assert_eq!(max_compressed_size(4096), 4096 + 1 + 13);
        assert!(max_compressed_size(1 << 20) > 1 << 20);
    }

    #[test]
    fn test_error_tiers() {
        let exhausted = Error::PoolExhausted { capacity: 4 };
        assert!(exhausted.is_recoverable());
        assert_eq!(exhausted.severity(), ErrorSeverity::Low);

        let fatal = Error::decompression("corrupt stream");
        assert!(!fatal.is_recoverable());
        assert_eq!(fatal.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_compression_level_validation() {
        assert!(CompressionLevel::new(1).is_ok());
        assert!(CompressionLevel::new(9).is_ok());
        assert!(CompressionLevel::new(0).is_err());
        assert!(CompressionLevel::new(10).is_err());
    }
}
