use criterion::{black_box, criterion_group, criterion_main, Criterion};
use protowire::encoding::{decode_varint, encode_varint, encoded_len_varint};

fn a_sequence_of_bytes(len: usize) -> Vec<u64> {
    (0..len as u64).map(|i| i.wrapping_mul(0x9E37_79B1)).collect()
}

fn benchmark_varint(criterion: &mut Criterion) {
    let values = a_sequence_of_bytes(1_000);

    let mut group = criterion.benchmark_group("varint");

    group.bench_function("encode", |b| {
        let mut buf = Vec::with_capacity(values.len() * 10);
        b.iter(|| {
            buf.clear();
            for &value in &values {
                encode_varint(black_box(value), &mut buf);
            }
        });
    });

    group.bench_function("decode", |b| {
        let mut buf = Vec::with_capacity(values.len() * 10);
        for &value in &values {
            encode_varint(value, &mut buf);
        }
        b.iter(|| {
            let mut slice = &buf[..];
            for _ in 0..values.len() {
                black_box(decode_varint(&mut slice).unwrap());
            }
        });
    });

    group.bench_function("encoded_len", |b| {
        b.iter(|| {
            for &value in &values {
                black_box(encoded_len_varint(black_box(value)));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_varint);
criterion_main!(benches);
