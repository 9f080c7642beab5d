//! Configuration management for accelflate
//!
//! Configuration is layered: built-in defaults, then an optional YAML, TOML or
//! JSON file, then `ACCELFLATE__*` environment variables. The result is
//! validated before it is handed to the codec.
//!
//! # Examples
//!
//! ```rust
//! use accelflate_config::{AcceleratorBackend, ConfigBuilder};
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_source_file("accelflate.yaml")
//!     .add_env_prefix("ACCELFLATE")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! if config.accelerator.backend == AcceleratorBackend::Simulated {
//!     println!("Pool capacity: {}", config.accelerator.capacity());
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use accelflate_types::{CodecMode, CompressionLevel};
use serde::{Deserialize, Serialize};

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ACCELFLATE";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Codec behaviour
    pub codec: CodecConfig,
    /// Accelerator selection
    pub accelerator: AcceleratorConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

/// Codec configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// DEFLATE level used by both tiers
    pub level: CompressionLevel,
    /// Decompression mode a fresh codec starts in
    pub decompress_mode: CodecMode,
}

/// Accelerator backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AcceleratorBackend {
    /// No accelerator; every call runs in software
    #[default]
    None,
    /// Software-emulated accelerator
    Simulated,
}

/// Accelerator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceleratorConfig {
    /// Which backend drives the job pool
    pub backend: AcceleratorBackend,
    /// Work-queue depths of the simulated device
    #[serde(default = "default_queue_depths")]
    pub queue_depths: Vec<usize>,
    /// Polls a simulated job reports as in flight
    #[serde(default = "default_completion_polls")]
    pub completion_polls: u32,
}

impl AcceleratorConfig {
    /// Pool capacity the simulated backend would expose
    pub fn capacity(&self) -> usize {
        self.queue_depths.iter().sum()
    }
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            backend: AcceleratorBackend::default(),
            queue_depths: default_queue_depths(),
            completion_polls: default_completion_polls(),
        }
    }
}

fn default_queue_depths() -> Vec<usize> {
    vec![8]
}

fn default_completion_polls() -> u32 {
    2
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable JSON formatting
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}
