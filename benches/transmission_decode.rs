//! Benchmarks for the transmission decode pipeline
//!
//! Covers the per-transmission work the coordinator does on the live path:
//! - Framing a hex transmission into raw blocks
//! - Decoding framed blocks into typed data blocks
//! - Converting blocks to and from mission log triples

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use groundstation::protocol::{BlockTriple, Transmission, decode_data_block};
use groundstation::test_utils::{data_block, payloads, transmission};
use groundstation::types::DataBlockSubtype;
use std::hint::black_box;

fn sample_blocks(count: usize) -> Vec<Vec<u8>> {
    (0..count as u32)
        .map(|i| match i % 4 {
            0 => data_block(DataBlockSubtype::Status, &payloads::status(i, 2, 3)),
            1 => data_block(DataBlockSubtype::Altitude, &payloads::altitude(i, 101_325, 20_000, 1_000)),
            2 => data_block(DataBlockSubtype::Acceleration, &payloads::tri_axis(i, 16, 10, -20, 2_048)),
            _ => data_block(
                DataBlockSubtype::GnssLocation,
                &payloads::gnss_location(i, 45.4215, -75.6972, 80_000, 9, 3),
            ),
        })
        .collect()
}

fn bench_transmission_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("transmission_parse");

    for blocks in [1usize, 4, 8] {
        let hex = transmission(1, &sample_blocks(blocks));
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &hex, |b, hex| {
            b.iter(|| black_box(Transmission::parse(black_box(hex))))
        });
    }

    group.finish();
}

fn bench_full_decode(c: &mut Criterion) {
    let hex = transmission(1, &sample_blocks(8));

    c.bench_function("parse_and_decode_8_blocks", |b| {
        b.iter(|| {
            let transmission = Transmission::parse(black_box(&hex)).ok()?;
            black_box(transmission.decode_blocks().ok())
        })
    });
}

fn bench_payload_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload_decode");

    let cases = [
        (DataBlockSubtype::Status, payloads::status(1, 2, 3)),
        (DataBlockSubtype::Altitude, payloads::altitude(1, 101_325, 20_000, 1_000)),
        (DataBlockSubtype::GnssLocation, payloads::gnss_location(1, 45.0, -75.0, 0, 9, 3)),
        (DataBlockSubtype::Imu, payloads::imu(1, [1, 2, 3], [4, 5, 6], [7, 8, 9])),
    ];

    for (subtype, payload) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(subtype), &payload, |b, payload| {
            b.iter(|| black_box(decode_data_block(subtype.raw(), black_box(payload))))
        });
    }

    group.finish();
}

fn bench_triple_round_trip(c: &mut Criterion) {
    let line = "2,3,0A000000CD8B0100204E0000E8030000";

    c.bench_function("triple_parse_and_decode", |b| {
        b.iter(|| {
            let triple: BlockTriple = black_box(line).parse().ok()?;
            black_box(triple.decode().ok())
        })
    });
}

criterion_group!(
    benches,
    bench_transmission_parse,
    bench_full_decode,
    bench_payload_decode,
    bench_triple_round_trip
);
criterion_main!(benches);
