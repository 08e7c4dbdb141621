use std::io::Cursor;

use chrono::{DateTime, Utc};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use rand::Rng;
use time64::{CertificateVersion, Time64, TimeScale, UtcTai};

fn bench_codec(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let times: Vec<Time64> = (0..1024).map(|_| Time64::from_elapsed(rng.gen())).collect();
    let mut encoded = Vec::with_capacity(times.len() * Time64::LEN);
    for time in &times {
        time.encode(&mut encoded).unwrap();
    }

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("encode", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(encoded.len());
            for time in &times {
                time.encode(&mut buf).unwrap();
            }
            buf
        });
    });
    group.bench_function("decode", |b| {
        b.iter(|| {
            let mut reader = Cursor::new(&encoded);
            let decoded: Vec<Time64> = (0..times.len())
                .map(|_| Time64::decode(&mut reader).unwrap())
                .collect();
            decoded
        });
    });
}

fn bench_conversion(c: &mut Criterion) {
    let scale = UtcTai::default();
    let time: DateTime<Utc> = DateTime::parse_from_rfc3339("2024-10-31T10:49:19.498544Z")
        .unwrap()
        .into();
    let t64 = Time64::from_datetime(CertificateVersion::V2, &time).unwrap();

    let mut group = c.benchmark_group("timescale");
    group.bench_function("to_tai", |b| {
        b.iter(|| scale.to_tai(&time).unwrap());
    });
    group.bench_function("from_datetime", |b| {
        b.iter(|| Time64::from_datetime_with(CertificateVersion::V2, &time, &scale).unwrap());
    });
    group.bench_function("to_datetime", |b| {
        b.iter(|| t64.to_datetime_with(CertificateVersion::V2, &scale).unwrap());
    });
}

criterion_group!(benches, bench_codec, bench_conversion);
criterion_main!(benches);
