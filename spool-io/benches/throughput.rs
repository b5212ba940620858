//! Throughput benchmarks for the ring buffer hot path and the full
//! writer pipeline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spool_core::RingBuffer;
use spool_io::{SpoolConfig, SpoolWriter, StorageBackend};
use std::io::SeekFrom;

/// Backend that discards everything, so the pipeline benchmark measures
/// buffering and thread handoff rather than disk speed.
struct NullBackend;

impl StorageBackend for NullBackend {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        Ok(data.len())
    }

    fn sync_data(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn seek(&mut self, _pos: SeekFrom) -> std::io::Result<u64> {
        Ok(0)
    }
}

/// Benchmark push/peek/advance cycles at various chunk sizes
fn bench_ring_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_cycle");

    for size in [256usize, 4096, 65536] {
        let chunk = vec![0xA5u8; size];
        let mut scratch = vec![0u8; size];
        let mut ring = RingBuffer::new(size * 4);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("push_peek_advance", size), &chunk, |b, chunk| {
            b.iter(|| {
                ring.push(chunk);
                let n = ring.peek(&mut scratch);
                ring.advance_read(n);
                black_box(n)
            });
        });
    }

    group.finish();
}

/// Benchmark producer-side write calls through the full threaded pipeline
fn bench_writer_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("writer_pipeline");
    group.sample_size(20);

    for size in [1024usize, 16384] {
        let chunk = vec![0x5Au8; size];
        let writer = SpoolWriter::with_backend(
            Box::new(NullBackend),
            SpoolConfig::new()
                .with_buffer_size(4 * 1024 * 1024)
                .with_min_write_size(64 * 1024),
        )
        .unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("write", size), &chunk, |b, chunk| {
            b.iter(|| black_box(writer.write(chunk)));
        });

        drop(writer);
    }

    group.finish();
}

criterion_group!(benches, bench_ring_cycle, bench_writer_pipeline);
criterion_main!(benches);
