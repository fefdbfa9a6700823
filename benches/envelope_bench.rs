use criterion::{black_box, criterion_group, criterion_main, Criterion};

use message_envelope::MessageEnvelope;

fn sample() -> MessageEnvelope {
    MessageEnvelope::with_fields("chat", "hello <world> & everyone in the lobby".repeat(8))
}

fn bench_encode(c: &mut Criterion) {
    let envelope = sample();
    c.bench_function("envelope_encode", |b| {
        b.iter(|| black_box(&envelope).encode().unwrap())
    });
}

fn bench_decode(c: &mut Criterion) {
    let text = sample().encode().unwrap();
    c.bench_function("envelope_decode", |b| {
        b.iter(|| MessageEnvelope::decode(black_box(&text)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
