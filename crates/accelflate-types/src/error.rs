//! Error types and handling for accelflate
//!
//! Errors are split into two tiers. Hardware-tier errors (`PoolExhausted`,
//! `HardwareExecution`) are recoverable: the codec answers them by falling
//! through to the software engine. Software-tier errors are fatal because no
//! further fallback exists.

use crate::JobOperation;

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - recovered locally by a lower tier
    Low,
    /// Medium severity - operation may be retried by the caller
    Medium,
    /// High severity - operation must be aborted
    High,
    /// Critical severity - the process cannot continue
    Critical,
}

/// Main error type for accelflate operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// No hardware job slot could be obtained within the bounded retries
    #[error("Hardware job pool exhausted (capacity {capacity})")]
    PoolExhausted {
        /// Capacity of the pool at the time of the failed acquire
        capacity: usize,
    },

    /// A submitted or executed hardware job reported a non-success status
    #[error("Hardware {operation} job failed with status code {code}")]
    HardwareExecution {
        /// Operation the job was performing
        operation: JobOperation,
        /// Status code reported by the accelerator
        code: u32,
    },

    /// Software compression failed
    #[error("Compression failed: {message}")]
    CompressionFailure {
        /// Error message describing the failure
        message: String,
    },

    /// Software decompression failed
    #[error("Decompression failed: {message}")]
    DecompressionFailure {
        /// Error message describing the failure
        message: String,
    },

    /// A job context or the pool could not be initialized
    #[error("Initialization of {component} failed: {message}")]
    Initialization {
        /// Component that failed to initialize
        component: String,
        /// Error message describing the failure
        message: String,
    },

    /// Accelerator topology could not be discovered
    #[error("Device detection error: {message}")]
    DeviceDetection {
        /// Error message describing the device detection issue
        message: String,
    },

    /// Destination buffer cannot hold the requested output
    #[error("Destination buffer too small: {required} bytes required, {available} available")]
    BufferTooSmall {
        /// Number of bytes required
        required: usize,
        /// Number of bytes available
        available: usize,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Configuration errors
    Config,
    /// Hardware pool exhaustion
    PoolExhausted,
    /// Hardware job failures
    HardwareExecution,
    /// Software compression failures
    Compression,
    /// Software decompression failures
    Decompression,
    /// Initialization failures
    Initialization,
    /// Device detection errors
    DeviceDetection,
    /// Undersized destination buffers
    BufferTooSmall,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Config { .. } => ErrorKind::Config,
            Self::PoolExhausted { .. } => ErrorKind::PoolExhausted,
            Self::HardwareExecution { .. } => ErrorKind::HardwareExecution,
            Self::CompressionFailure { .. } => ErrorKind::Compression,
            Self::DecompressionFailure { .. } => ErrorKind::Decompression,
            Self::Initialization { .. } => ErrorKind::Initialization,
            Self::DeviceDetection { .. } => ErrorKind::DeviceDetection,
            Self::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::PoolExhausted { .. } | Self::HardwareExecution { .. } => ErrorSeverity::Low,
            Self::DeviceDetection { .. } => ErrorSeverity::Low,
            Self::Io { .. } | Self::Other { .. } => ErrorSeverity::Medium,
            Self::Config { .. } => ErrorSeverity::High,
            Self::CompressionFailure { .. } | Self::DecompressionFailure { .. } => {
                ErrorSeverity::High
            }
            Self::BufferTooSmall { .. } => ErrorSeverity::High,
            Self::Initialization { .. } => ErrorSeverity::Critical,
        }
    }

    /// Check if this error is recovered by falling through to the software tier
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PoolExhausted { .. } | Self::HardwareExecution { .. }
        )
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new software compression error
    pub fn compression<S: Into<String>>(message: S) -> Self {
        Self::CompressionFailure {
            message: message.into(),
        }
    }

    /// Create a new software decompression error
    pub fn decompression<S: Into<String>>(message: S) -> Self {
        Self::DecompressionFailure {
            message: message.into(),
        }
    }

    /// Create a new initialization error
    pub fn initialization<C: Into<String>, S: Into<String>>(component: C, message: S) -> Self {
        Self::Initialization {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a new device detection error
    pub fn device_detection<S: Into<String>>(message: S) -> Self {
        Self::DeviceDetection {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_only_hardware_tier_is_recoverable(message in ".*", code in any::<u32>()) {
            let errors = vec![
                Error::Io { message: message.clone() },
                Error::Config { message: message.clone() },
                Error::PoolExhausted { capacity: 8 },
                Error::HardwareExecution { operation: JobOperation::Decompress, code },
                Error::CompressionFailure { message: message.clone() },
                Error::DecompressionFailure { message: message.clone() },
                Error::Initialization { component: "pool".into(), message: message.clone() },
                Error::DeviceDetection { message: message.clone() },
                Error::Other { message: message.clone() },
            ];

            for error in errors {
                let hardware_tier = matches!(
                    error.kind(),
                    ErrorKind::PoolExhausted | ErrorKind::HardwareExecution
                );
                prop_assert_eq!(error.is_recoverable(), hardware_tier);
                if error.is_recoverable() {
                    prop_assert_eq!(error.severity(), ErrorSeverity::Low);
                }
            }
        }
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Low < ErrorSeverity::Medium);
        assert!(ErrorSeverity::Medium < ErrorSeverity::High);
        assert!(ErrorSeverity::High < ErrorSeverity::Critical);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "block file");
        let error = Error::from(io_error);

        assert_eq!(error.kind(), ErrorKind::Io);
        assert_eq!(error.severity(), ErrorSeverity::Medium);
        assert!(error.to_string().contains("block file"));
    }

    #[test]
    fn test_hardware_execution_display() {
        let error = Error::HardwareExecution {
            operation: JobOperation::Compress,
            code: 17,
        };
        assert_eq!(
            error.to_string(),
            "Hardware compress job failed with status code 17"
        );
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_initialization_is_critical() {
        let error = Error::initialization("software job context", "out of memory");
        assert_eq!(error.kind(), ErrorKind::Initialization);
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert!(!error.is_recoverable());
        assert!(error.to_string().contains("software job context"));
    }

    #[test]
    fn test_buffer_too_small_display() {
        let error = Error::BufferTooSmall {
            required: 100,
            available: 10,
        };
        assert!(error.to_string().contains("100 bytes required"));
        assert!(!error.is_recoverable());
    }
}
