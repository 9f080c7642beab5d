//! Process-wide pool lifecycle
//!
//! Kept in its own test binary: the global pool can only be installed once
//! per process.

use accelflate_codec::{install_global_pool, DeflateAccelCodec, JobPool};
use accelflate_config::{AcceleratorBackend, AcceleratorConfig};
use accelflate_tests::test_utils::{generate_test_data, TestDataPattern};
use std::sync::Arc;

#[test]
fn test_global_pool_lifecycle() {
    let config = AcceleratorConfig {
        backend: AcceleratorBackend::Simulated,
        queue_depths: vec![3, 1],
        completion_polls: 1,
    };

    let pool = install_global_pool(&config);
    assert!(pool.is_ready());
    assert_eq!(pool.capacity(), 4);
    assert_eq!(pool.driver_name(), "simulated");

    // later installs keep the first pool
    let again = install_global_pool(&AcceleratorConfig::default());
    assert!(Arc::ptr_eq(&pool, &again));
    assert!(Arc::ptr_eq(&pool, &JobPool::global()));

    let mut codec = DeflateAccelCodec::from_global();
    let data = generate_test_data(12_000, TestDataPattern::Mixed);
    let compressed = codec.compress(&data).unwrap();
    assert_eq!(codec.stats().hardware_compressions, 1);

    JobPool::shutdown_global();
    JobPool::shutdown_global();
    assert!(!pool.is_ready());

    // torn down: the codec keeps working in software
    assert_eq!(codec.decompress(&compressed, data.len()).unwrap(), data);
    assert_eq!(codec.stats().software_decompressions, 1);
    assert!(pool.acquire().is_err());
}
