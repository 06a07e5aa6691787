use std::hint::black_box;
use std::io::Cursor;

use chrono::{Duration, NaiveDate};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use logmerge::{parse_entry, LogMerger};

const LINES_PER_SOURCE: usize = 2_000;

/// `count` lines one second apart, starting `offset` seconds into the day
fn synthetic_log(offset: i64, stride: i64, count: usize) -> Vec<u8> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut out = String::with_capacity(count * 48);
    for i in 0..count {
        let t = base + Duration::seconds(offset + stride * i as i64);
        out.push_str(&format!(
            "{} INFO request {} served in 12ms\n",
            t.format("%Y-%m-%d %H:%M:%S"),
            i
        ));
    }
    out.into_bytes()
}

fn bench_parse_entry(c: &mut Criterion) {
    let line = "2024-01-01 10:00:00 WARN cache miss for key user:42 after 3 retries\n";
    c.bench_function("parse_entry", |b| {
        b.iter(|| black_box(parse_entry(black_box(line))).is_ok());
    });
}

fn bench_merge_sources(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_sources");
    for sources in [1usize, 4, 16] {
        let inputs: Vec<Vec<u8>> = (0..sources)
            .map(|s| synthetic_log(s as i64, sources as i64, LINES_PER_SOURCE))
            .collect();
        group.throughput(Throughput::Elements((sources * LINES_PER_SOURCE) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(sources), &inputs, |b, inputs| {
            b.iter(|| {
                let merger = LogMerger::new();
                for input in inputs {
                    merger.add_source(Cursor::new(input.clone()));
                }
                merger.seal();
                black_box(merger.stream().count())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse_entry, bench_merge_sources);
criterion_main!(benches);
