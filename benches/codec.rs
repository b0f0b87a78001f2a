//! Codec and chunking benchmarks
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use swarmfetch::client::chunks;
use swarmfetch::wire;
use swarmfetch::{ChunkRequest, ChunkResponse};

fn response(size: usize) -> ChunkResponse {
    let data = (0..size).map(|i| (i % 251) as u8).collect();
    ChunkResponse::ok(ChunkRequest::new("bench.bin", 0, size as u64), data)
}

/// Encode and decode chunk responses of increasing size
fn bench_chunk_response_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_response_codec");
    let rt = Runtime::new().unwrap();

    for size in [4 * 1024, 64 * 1024, 1024 * 1024].iter() {
        let message = response(*size);
        let frame = wire::encode(&message).unwrap();
        group.throughput(Throughput::Bytes(*size as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &message, |b, message| {
            b.iter(|| wire::encode(black_box(message)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("decode", size), &frame, |b, frame| {
            b.to_async(&rt).iter(|| async {
                let mut reader = &frame[..];
                let frame = wire::decode(&mut reader).await.unwrap();
                black_box(frame.parse::<ChunkResponse>().unwrap())
            });
        });
    }

    group.finish();
}

/// Split large files into chunk requests
fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");

    for chunk_size in [64 * 1024u64, 1024 * 1024].iter() {
        group.bench_with_input(
            BenchmarkId::new("4GiB", chunk_size),
            chunk_size,
            |b, &chunk_size| {
                b.iter(|| chunks::split("disk.iso", black_box(4 << 30), chunk_size).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_chunk_response_codec, bench_split);
criterion_main!(benches);
