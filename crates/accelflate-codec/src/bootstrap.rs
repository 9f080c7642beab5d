//! Building pools and codecs from configuration

use crate::codec::DeflateAccelCodec;
use crate::pool::JobPool;
use accelflate_config::{AcceleratorBackend, AcceleratorConfig, Config};
use accelflate_device::{AcceleratorDriver, NullAccelerator, SimulatedAccelerator, SimulatedConfig};
use std::sync::Arc;
use tracing::info;

/// Driver selected by the accelerator configuration
pub fn driver_from_config(config: &AcceleratorConfig) -> Box<dyn AcceleratorDriver> {
    match config.backend {
        AcceleratorBackend::None => Box::new(NullAccelerator),
        AcceleratorBackend::Simulated => Box::new(SimulatedAccelerator::new(SimulatedConfig {
            queue_depths: config.queue_depths.clone(),
            completion_polls: config.completion_polls,
        })),
    }
}

/// Install the process-wide pool for `config`
///
/// The first installation wins; see [`JobPool::install_global`].
pub fn install_global_pool(config: &AcceleratorConfig) -> Arc<JobPool> {
    let driver = driver_from_config(config);
    let pool = JobPool::install_global(driver.as_ref());
    info!(
        driver = pool.driver_name(),
        capacity = pool.capacity(),
        ready = pool.is_ready(),
        "Job pool installed"
    );
    pool
}

/// Codec on `pool` configured from `config`
pub fn codec_from_config(pool: Arc<JobPool>, config: &Config) -> DeflateAccelCodec {
    DeflateAccelCodec::from_config(pool, &config.codec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use accelflate_types::CodecMode;

    #[test]
    fn test_backend_selection() {
        let mut config = AcceleratorConfig::default();
        assert_eq!(driver_from_config(&config).name(), "none");

        config.backend = AcceleratorBackend::Simulated;
        config.queue_depths = vec![2, 2];
        let driver = driver_from_config(&config);
        assert_eq!(driver.name(), "simulated");
        assert_eq!(driver.probe().unwrap().total_queue_depth(), 4);
    }

    #[test]
    fn test_codec_from_config() {
        let mut config = Config::default();
        config.accelerator.backend = AcceleratorBackend::Simulated;
        config.codec.decompress_mode = CodecMode::Asynchronous;

        let pool = JobPool::shared(driver_from_config(&config.accelerator).as_ref());
        let codec = codec_from_config(pool, &config);
        assert!(codec.hardware_available());
        assert_eq!(codec.decompress_mode(), CodecMode::Asynchronous);
    }
}
