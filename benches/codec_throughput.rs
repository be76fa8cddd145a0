//! Codec Throughput Benchmarks
//!
//! Measures parse/encode rates for the text and binary codecs across record
//! sizes, and the vector codecs across embedding dimensions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lnmp::{
    encode_position3d, quantize_embedding, BinaryDecoder, BinaryEncoder, Encoder, LnmpRecord,
    LnmpValue, Parser, Position3D, QuantScheme, VectorDelta,
};

fn build_record(fields: usize) -> LnmpRecord {
    let mut record = LnmpRecord::new();
    for i in 0..fields as u32 {
        match i % 4 {
            0 => record.set(i, LnmpValue::Int(i64::from(i) * 37)),
            1 => record.set(i, LnmpValue::Str(format!("value-{i}"))),
            2 => record.set(i, LnmpValue::Float(f64::from(i) * 0.25)),
            _ => record.set(
                i,
                LnmpValue::List(vec![format!("a{i}"), format!("b{i}")]),
            ),
        }
    }
    record
}

fn build_vector(dims: usize) -> Vec<f32> {
    (0..dims).map(|i| ((i as f32) * 0.37).sin()).collect()
}

fn bench_text_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_codec");
    for fields in [4usize, 16, 64] {
        let record = build_record(fields);
        let text = Encoder::new().encode(&record);

        group.bench_with_input(BenchmarkId::new("encode", fields), &record, |b, r| {
            b.iter(|| black_box(Encoder::new().encode(black_box(r))))
        });
        group.bench_with_input(BenchmarkId::new("parse", fields), &text, |b, t| {
            b.iter(|| {
                black_box(
                    Parser::new(black_box(t))
                        .unwrap()
                        .parse_record()
                        .unwrap(),
                )
            })
        });
    }
    group.finish();
}

fn bench_binary_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_codec");
    for fields in [4usize, 16, 64] {
        let record = build_record(fields);
        let bytes = BinaryEncoder::new().encode(&record).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", fields), &record, |b, r| {
            b.iter(|| black_box(BinaryEncoder::new().encode(black_box(r)).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("decode", fields), &bytes, |b, bs| {
            b.iter(|| black_box(BinaryDecoder::new().decode(black_box(bs)).unwrap()))
        });
    }
    group.finish();
}

fn bench_vector_codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_codecs");
    for dims in [128usize, 768] {
        let base = build_vector(dims);
        let mut updated = base.clone();
        for i in (0..dims).step_by(16) {
            updated[i] += 0.5;
        }

        group.bench_with_input(
            BenchmarkId::new("delta_and_encode", dims),
            &(base.clone(), updated),
            |b, (base, updated)| {
                b.iter(|| {
                    let delta = VectorDelta::from_vectors(black_box(base), black_box(updated))
                        .unwrap();
                    black_box(delta.encode())
                })
            },
        );

        for scheme in [QuantScheme::QInt8, QuantScheme::QInt4, QuantScheme::Binary] {
            group.bench_with_input(
                BenchmarkId::new(format!("quantize_{scheme}"), dims),
                &base,
                |b, v| b.iter(|| black_box(quantize_embedding(black_box(v), scheme).unwrap())),
            );
        }
    }
    group.finish();
}

fn bench_spatial(c: &mut Criterion) {
    c.bench_function("spatial_encode", |b| {
        let pos = Position3D::new(12.5, -3.25, 101.75);
        b.iter(|| black_box(encode_position3d(black_box(pos))))
    });
}

criterion_group!(
    benches,
    bench_text_codec,
    bench_binary_codec,
    bench_vector_codecs,
    bench_spatial
);
criterion_main!(benches);
