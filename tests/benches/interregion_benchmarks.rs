//! # Interregion Hot-Path Benchmarks
//!
//! Work done on every inbound peer request before the scene is reached:
//!
//! | Path | Work | Target |
//! |------|------|--------|
//! | Peer auth | constant-time credential check | < 1µs |
//! | Entity path | `/{kind}/{uuid}/{handle}/{action}` parse | < 1µs |
//! | Nonce ledger | `contains` under a full retention window | < 10µs |
//! | Binary frame | object2 body decode | < 50µs for 64 KiB |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ir_01_peer_auth::GridSendKey;
use ir_02_nonce_ledger::NonceLedger;
use shared_types::wire::binary::{decode_frame, encode_frame, ObjectPostMessage};
use shared_types::{BincodeObjectCodec, CrossingNonce, EntityPath, ObjectCodec, RideAlong, SceneObject, Vector3};
use uuid::Uuid;

fn bench_peer_auth(c: &mut Criterion) {
    let key = GridSendKey::new("bench-grid-key");
    let good = key.authorization();
    let bad = GridSendKey::new("bench-grid-kez").authorization();

    let mut group = c.benchmark_group("ir-01-peer-auth");
    group.bench_function("verify_trusted", |b| b.iter(|| black_box(key.verify(black_box(&good)))));
    group.bench_function("verify_untrusted", |b| b.iter(|| black_box(key.verify(black_box(&bad)))));
    group.finish();
}

fn bench_entity_path(c: &mut Criterion) {
    let path = format!("/agent/{}/1099511628032000/release/", Uuid::new_v4());
    c.bench_function("shared-types/entity_path_parse", |b| {
        b.iter(|| black_box(EntityPath::parse(black_box(&path))))
    });
}

fn bench_nonce_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("ir-02-nonce-ledger");
    for size in [100u64, 10_000, 100_000] {
        let ledger = NonceLedger::new();
        for n in 0..size {
            ledger.remember_for_retention(CrossingNonce(n));
        }
        group.bench_with_input(BenchmarkId::new("contains_miss", size), &ledger, |b, ledger| {
            b.iter(|| black_box(ledger.contains(CrossingNonce(u64::MAX))))
        });
    }
    group.bench_function("remember_then_consume", |b| {
        let ledger = NonceLedger::new();
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            ledger.remember_for_retention(CrossingNonce(n));
            black_box(ledger.contains(CrossingNonce(n)))
        })
    });
    group.finish();
}

fn bench_object_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-types-object-frame");
    for kib in [1usize, 16, 64] {
        let mut obj = SceneObject::new(Uuid::new_v4(), "bench", Uuid::new_v4(), Vector3::new(1.0, 2.0, 3.0));
        obj.geometry = vec![0x5A; kib * 1024];
        let snapshot = BincodeObjectCodec.encode(&obj).unwrap();
        let frame = encode_frame(&ObjectPostMessage::new(&snapshot, None, &RideAlong::Count(1))).unwrap();

        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::new("decode", kib), &frame, |b, frame| {
            b.iter(|| {
                let message: ObjectPostMessage = decode_frame(black_box(frame)).unwrap();
                black_box(BincodeObjectCodec.decode(&message.snapshot()).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_peer_auth,
    bench_entity_path,
    bench_nonce_ledger,
    bench_object_frame
);
criterion_main!(benches);
