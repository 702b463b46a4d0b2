use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use libuhf::protocol::crc16;

fn bench_crc16(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc16");
    for &size in &[2usize, 16, 64, 255] {
        let payload: Vec<u8> = (0..size).map(|i| (i & 0xff) as u8).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, p| {
            b.iter(|| {
                black_box(crc16(black_box(p)));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_crc16);
criterion_main!(benches);
