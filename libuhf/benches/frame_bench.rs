use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use libuhf::protocol::{CrcMode, Frame};

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode");
    for &size in &[0usize, 16, 64, 250] {
        let mut cmd = vec![0x22u8];
        cmd.extend((0..size).map(|i| (i & 0xff) as u8));
        group.bench_with_input(BenchmarkId::from_parameter(size), &cmd, |b, cmd| {
            b.iter(|| {
                black_box(Frame::encode(black_box(cmd), CrcMode::Enabled).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");
    for &size in &[0usize, 16, 64, 250] {
        let mut cmd = vec![0x29u8];
        cmd.extend((0..size).map(|i| (i & 0xff) as u8));
        let bytes = Frame::encode(&cmd, CrcMode::Enabled).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| {
                black_box(Frame::decode(black_box(bytes), CrcMode::Enabled).unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
