use criterion::{black_box, criterion_group, criterion_main, Criterion};

use json_logger::{Attribute, Emitter, Extras, Level, Options, Record};

fn sink_emitter() -> Emitter {
    Emitter::new(std::io::sink(), Options::default(), Extras::default())
}

fn bench_basic_record(c: &mut Criterion) {
    let emitter = sink_emitter();
    let record = Record::new(Level::Info, "benchmark message");
    c.bench_function("emit_basic", |b| {
        b.iter(|| emitter.emit(black_box(&record)).unwrap())
    });
}

fn bench_scalar_attributes(c: &mut Criterion) {
    let emitter = sink_emitter();
    let mut record = Record::new(Level::Info, "benchmark message");
    record.add_attributes(vec![
        Attribute::string("name", "value"),
        Attribute::int("count", 1234567),
        Attribute::float("ratio", 0.357),
        Attribute::bool("flag", true),
        Attribute::duration("elapsed", std::time::Duration::from_micros(2500)),
    ]);
    c.bench_function("emit_scalar_attributes", |b| {
        b.iter(|| emitter.emit(black_box(&record)).unwrap())
    });
}

fn bench_derived_prefix(c: &mut Criterion) {
    // The derived attributes are serialized once, here, not per emit.
    let emitter = sink_emitter().with_attributes(vec![
        Attribute::string("app", "bench"),
        Attribute::string("host", "node-17"),
        Attribute::int("pid", 41234),
    ]);
    let record = Record::new(Level::Info, "benchmark message");
    c.bench_function("emit_with_derived_prefix", |b| {
        b.iter(|| emitter.emit(black_box(&record)).unwrap())
    });
}

fn bench_group(c: &mut Criterion) {
    let emitter = sink_emitter().with_group("request");
    let mut record = Record::new(Level::Info, "benchmark message");
    record.add_attributes(vec![
        Attribute::string("method", "GET"),
        Attribute::int("status", 200),
    ]);
    c.bench_function("emit_into_group", |b| {
        b.iter(|| emitter.emit(black_box(&record)).unwrap())
    });
}

fn bench_elided_group(c: &mut Criterion) {
    // No call-site attributes: the group collapses and the parent emits.
    let emitter = sink_emitter().with_group("request").with_group("detail");
    let record = Record::new(Level::Info, "benchmark message");
    c.bench_function("emit_elided_group", |b| {
        b.iter(|| emitter.emit(black_box(&record)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_basic_record,
    bench_scalar_attributes,
    bench_derived_prefix,
    bench_group,
    bench_elided_group
);
criterion_main!(benches);
