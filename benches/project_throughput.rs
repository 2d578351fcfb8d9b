//! Projection throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use avrolens::decoder::{encode_zigzag, BinaryDecoder};
use avrolens::projector::DatumProjector;
use avrolens::schema::parse_schema;

fn push_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&encode_zigzag(s.len() as i64));
    buf.extend_from_slice(s.as_bytes());
}

fn bench_identity_record(c: &mut Criterion) {
    let schema = parse_schema(
        r#"{"type": "record", "name": "Event", "fields": [
            {"name": "id", "type": "long"},
            {"name": "source", "type": "string"},
            {"name": "score", "type": "double"},
            {"name": "tags", "type": {"type": "array", "items": "string"}}
        ]}"#,
    )
    .unwrap();
    let projector = DatumProjector::new(&schema, &schema).unwrap();

    let mut data = encode_zigzag(123_456_789);
    push_string(&mut data, "sensor-eu-west-42");
    data.extend_from_slice(&0.875f64.to_le_bytes());
    data.extend_from_slice(&encode_zigzag(3));
    push_string(&mut data, "a");
    push_string(&mut data, "bb");
    push_string(&mut data, "ccc");
    data.extend_from_slice(&encode_zigzag(0));

    c.bench_function("identity_record", |b| {
        b.iter(|| {
            let mut dec = BinaryDecoder::new(black_box(&data));
            projector.project(&mut dec).unwrap()
        })
    });
}

fn bench_evolved_record(c: &mut Criterion) {
    // Writer has a field the reader dropped; reader has a default and an
    // int field the reader widens to long.
    let writer = parse_schema(
        r#"{"type": "record", "name": "Event", "fields": [
            {"name": "id", "type": "int"},
            {"name": "debug", "type": "string"},
            {"name": "source", "type": "string"}
        ]}"#,
    )
    .unwrap();
    let reader = parse_schema(
        r#"{"type": "record", "name": "Event", "fields": [
            {"name": "id", "type": "long"},
            {"name": "source", "type": "string"},
            {"name": "retries", "type": "int", "default": 0}
        ]}"#,
    )
    .unwrap();
    let projector = DatumProjector::new(&reader, &writer).unwrap();

    let mut data = encode_zigzag(42);
    push_string(&mut data, "internal trace payload");
    push_string(&mut data, "sensor-eu-west-42");

    c.bench_function("evolved_record", |b| {
        b.iter(|| {
            let mut dec = BinaryDecoder::new(black_box(&data));
            projector.project(&mut dec).unwrap()
        })
    });
}

criterion_group!(benches, bench_identity_record, bench_evolved_record);
criterion_main!(benches);
