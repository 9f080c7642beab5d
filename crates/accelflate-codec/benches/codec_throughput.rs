//! Codec throughput: software tier against the simulated accelerator

use accelflate_codec::{DecompressTarget, DeflateAccelCodec, JobPool};
use accelflate_device::SimulatedAccelerator;
use accelflate_types::CodecMode;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

const BLOCK_SIZE: usize = 64 * 1024;

fn sample(size: usize) -> Vec<u8> {
    (0..size).map(|i| ((i * 31 / 17) % 97) as u8).collect()
}

fn codecs() -> Vec<(&'static str, DeflateAccelCodec)> {
    vec![
        (
            "software",
            DeflateAccelCodec::new(Arc::new(JobPool::disabled())),
        ),
        (
            "simulated",
            DeflateAccelCodec::new(JobPool::shared(&SimulatedAccelerator::with_capacity(8))),
        ),
    ]
}

fn bench_compress(c: &mut Criterion) {
    let data = sample(BLOCK_SIZE);
    let mut group = c.benchmark_group("codec_compress");
    group.throughput(Throughput::Bytes(data.len() as u64));

    for (name, mut codec) in codecs() {
        let mut dest = vec![0u8; codec.max_compressed_data_size(data.len())];
        group.bench_with_input(BenchmarkId::from_parameter(name), &data, |b, data| {
            b.iter(|| black_box(codec.compress_data(data, &mut dest).unwrap()));
        });
    }
    group.finish();
}

fn bench_decompress_modes(c: &mut Criterion) {
    let data = sample(BLOCK_SIZE);
    let mut group = c.benchmark_group("codec_decompress");
    group.throughput(Throughput::Bytes(data.len() as u64 * 8));

    for mode in [CodecMode::Synchronous, CodecMode::Asynchronous] {
        let pool = JobPool::shared(&SimulatedAccelerator::with_capacity(8));
        let mut codec = DeflateAccelCodec::new(pool);
        let compressed = codec.compress(&data).unwrap();
        let targets: Vec<DecompressTarget> = (0..8).map(|_| DecompressTarget::new()).collect();

        group.bench_function(BenchmarkId::from_parameter(mode), |b| {
            b.iter(|| {
                codec.set_decompress_mode(mode);
                for target in &targets {
                    codec
                        .decompress_data(&compressed, target, data.len())
                        .unwrap();
                }
                codec.flush_asynchronous_decompress_requests().unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress_modes);
criterion_main!(benches);
