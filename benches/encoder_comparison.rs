//! Benchmark comparing the staging ValueEncoder vs the in-place BufEncoder

use criterion::{criterion_group, criterion_main, Criterion};

use amqp091_codec::{
    decode_field_value, BufEncoder, Decimal, FieldTable, FieldValue, SliceDecoder,
    ValueEncoder,
};

fn create_headers() -> FieldValue {
    let mut props = FieldTable::new();
    props
        .insert("content-type", FieldValue::ShortString("application/json".into()))
        .unwrap();
    props.insert("delivery-mode", FieldValue::UInt8(2)).unwrap();
    props.insert("priority", FieldValue::UInt8(5)).unwrap();
    props
        .insert("price", FieldValue::Decimal(Decimal::new(false, 104_999, 3)))
        .unwrap();
    props
        .insert(
            "x-death-reasons",
            FieldValue::Array(vec![
                FieldValue::ShortString("rejected".into()),
                FieldValue::ShortString("expired".into()),
                FieldValue::Int64(3),
            ]),
        )
        .unwrap();

    let mut headers = FieldTable::new();
    headers
        .insert("app-id", FieldValue::ShortString("billing".into()))
        .unwrap();
    headers.insert("attempt", FieldValue::UInt32(17)).unwrap();
    headers.insert("properties", FieldValue::Table(props)).unwrap();

    FieldValue::Table(headers)
}

fn bench_staging_encoder(c: &mut Criterion) {
    let headers = create_headers();

    c.bench_function("staging_encoder_nested_table", |b| {
        b.iter(|| {
            let mut wire = Vec::new();
            ValueEncoder::new(&mut wire)
                .encode_field_value(&headers)
                .unwrap();
            criterion::black_box(wire);
        })
    });
}

fn bench_patching_encoder(c: &mut Criterion) {
    let headers = create_headers();

    c.bench_function("patching_encoder_nested_table", |b| {
        b.iter(|| {
            let mut wire = Vec::new();
            BufEncoder::new(&mut wire)
                .encode_field_value(&headers)
                .unwrap();
            criterion::black_box(wire);
        })
    });
}

fn bench_patching_encoder_with_buffer(c: &mut Criterion) {
    let headers = create_headers();
    let mut wire = Vec::with_capacity(4096);

    c.bench_function("patching_encoder_reused_buffer", |b| {
        b.iter(|| {
            wire.clear();
            BufEncoder::new(&mut wire)
                .encode_field_value(&headers)
                .unwrap();
            criterion::black_box(wire.len());
        })
    });
}

fn bench_decoders(c: &mut Criterion) {
    let headers = create_headers();
    let mut wire = Vec::new();
    ValueEncoder::new(&mut wire)
        .encode_field_value(&headers)
        .unwrap();

    c.bench_function("stream_decoder_nested_table", |b| {
        b.iter(|| {
            let value = decode_field_value(&mut wire.as_slice()).unwrap();
            criterion::black_box(value);
        })
    });

    c.bench_function("slice_decoder_nested_table", |b| {
        b.iter(|| {
            let value = SliceDecoder::new(&wire).decode_field_value().unwrap();
            criterion::black_box(value);
        })
    });
}

criterion_group!(
    benches,
    bench_staging_encoder,
    bench_patching_encoder,
    bench_patching_encoder_with_buffer,
    bench_decoders
);
criterion_main!(benches);
