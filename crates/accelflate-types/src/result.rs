//! Result type alias for accelflate operations

use crate::Error;

/// Result type alias for accelflate operations
pub type Result<T> = std::result::Result<T, Error>;
