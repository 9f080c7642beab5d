//! Test data generators shared by the integration tests

use accelflate_codec::{DeflateAccelCodec, JobPool};
use accelflate_device::SimulatedAccelerator;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;

/// Test data generation patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestDataPattern {
    /// All zeros - highly compressible
    Zeros,
    /// Seeded random bytes - incompressible
    Random,
    /// Runs of repeated bytes between random stretches
    Mixed,
    /// Repeated English-like text
    Text,
}

/// Generate `size` bytes following `pattern`
///
/// Random content comes from a fixed seed so failures reproduce.
pub fn generate_test_data(size: usize, pattern: TestDataPattern) -> Vec<u8> {
    match pattern {
        TestDataPattern::Zeros => vec![0u8; size],
        TestDataPattern::Random => {
            let mut data = vec![0u8; size];
            StdRng::seed_from_u64(0x5EED).fill_bytes(&mut data);
            data
        }
        TestDataPattern::Mixed => {
            let mut rng = StdRng::seed_from_u64(size as u64);
            (0..size)
                .map(|i| {
                    if i % 1000 < 300 {
                        (i / 1000) as u8
                    } else {
                        (rng.next_u32() & 0xFF) as u8
                    }
                })
                .collect()
        }
        TestDataPattern::Text => {
            const WORDS: &[&str] = &[
                "accelerator", "queue", "slot", "deflate", "block", "flush", "the", "a", "of",
            ];
            let mut rng = StdRng::seed_from_u64(7);
            let mut data = Vec::with_capacity(size + 16);
            while data.len() < size {
                let word = WORDS[(rng.next_u32() as usize) % WORDS.len()];
                data.extend_from_slice(word.as_bytes());
                data.push(b' ');
            }
            data.truncate(size);
            data
        }
    }
}

/// A batch of distinct payloads, each paired with its compressed form
pub fn compressed_payloads(count: usize, size: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut codec = DeflateAccelCodec::new(Arc::new(JobPool::disabled()));
    (0..count)
        .map(|i| {
            let mut plain = generate_test_data(size, TestDataPattern::Text);
            plain.extend_from_slice(format!("payload {}", i).as_bytes());
            let compressed = codec
                .compress(&plain)
                .unwrap_or_else(|e| panic!("compressing payload {} failed: {}", i, e));
            (plain, compressed)
        })
        .collect()
}

/// Shared pool backed by a simulated accelerator with `capacity` slots
///
/// The accelerator is returned too so tests can arm its fault injector.
pub fn simulated_pool(capacity: usize) -> (Arc<JobPool>, SimulatedAccelerator) {
    let accelerator = SimulatedAccelerator::with_capacity(capacity);
    let pool = JobPool::shared(&accelerator);
    (pool, accelerator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_sizes() {
        for pattern in [
            TestDataPattern::Zeros,
            TestDataPattern::Random,
            TestDataPattern::Mixed,
            TestDataPattern::Text,
        ] {
            assert_eq!(generate_test_data(1234, pattern).len(), 1234);
            assert!(generate_test_data(0, pattern).is_empty());
        }
    }

    #[test]
    fn test_random_is_reproducible() {
        assert_eq!(
            generate_test_data(256, TestDataPattern::Random),
            generate_test_data(256, TestDataPattern::Random)
        );
    }

    #[test]
    fn test_payloads_are_distinct() {
        let payloads = compressed_payloads(3, 100);
        assert_ne!(payloads[0].0, payloads[1].0);
        assert!(payloads.iter().all(|(_, c)| !c.is_empty()));
    }
}
