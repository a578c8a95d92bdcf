//! Throughput Benchmark for microkv
//!
//! This benchmark measures the store, the dispatcher and the frame decoder
//! under various workloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use microkv::commands::CommandDispatcher;
use microkv::protocol::{decode_request, encode_command};
use microkv::storage::{Db, ExpireOptions, SetOptions, Store};
use std::thread;
use std::time::{Duration, Instant};

fn populated_db(n: usize) -> Db {
    let db = Db::default();
    {
        let mut store = db.lock();
        for i in 0..n {
            store.set(
                format!("key:{}", i),
                format!("value:{}", i),
                SetOptions::default(),
            );
        }
    }
    db
}

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let db = Db::default();

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            db.lock().set(
                format!("key:{}", i),
                "small_value".to_string(),
                SetOptions::default(),
            );
            i += 1;
        });
    });

    group.bench_function("set_1kb", |b| {
        let mut i = 0u64;
        let value = "x".repeat(1024);
        b.iter(|| {
            db.lock()
                .set(format!("key:{}", i), value.clone(), SetOptions::default());
            i += 1;
        });
    });

    group.bench_function("set_nx_existing", |b| {
        let options = SetOptions {
            only_if_absent: true,
            ..Default::default()
        };
        b.iter(|| {
            black_box(db.lock().set("key:0".to_string(), "v".to_string(), options));
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let db = populated_db(100_000);

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(db.lock().get(&key));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(db.lock().get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes) through the dispatcher
fn bench_dispatch(c: &mut Criterion) {
    let dispatcher = CommandDispatcher::new(populated_db(10_000));

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let args = if i % 5 == 0 {
                vec!["SET".to_string(), format!("new:{}", i), "value".to_string()]
            } else {
                vec!["GET".to_string(), format!("key:{}", i % 10_000)]
            };
            black_box(dispatcher.execute(&args));
            i += 1;
        });
    });

    group.bench_function("decode_and_execute", |b| {
        let frame = encode_command(&["SET", "session", "token", "EX", "3600"]);
        b.iter(|| {
            if let Ok(Some((microkv::Request::Command(args), _))) = decode_request(&frame) {
                black_box(dispatcher.execute(&args).serialize());
            }
        });
    });

    group.finish();
}

/// Benchmark concurrent access through the shared lock
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let db = Db::default();
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let db = db.clone();
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = format!("key:{}:{}", t, i);
                            db.lock()
                                .set(key.clone(), "value".to_string(), SetOptions::default());
                            db.lock().get(&key);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(db.lock().len());
        });
    });

    group.finish();
}

/// Benchmark expiry operations
fn bench_expiry(c: &mut Criterion) {
    let db = populated_db(10_000);

    let mut group = c.benchmark_group("expiry");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_with_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            db.lock().set(
                format!("ttl:{}", i),
                "value".to_string(),
                SetOptions {
                    expires_at: Some(Instant::now() + Duration::from_secs(3600)),
                    ..Default::default()
                },
            );
            i += 1;
        });
    });

    group.bench_function("expire_gt", |b| {
        let options = ExpireOptions {
            only_if_greater: true,
            ..Default::default()
        };
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 10_000);
            black_box(db.lock().expire(&key, 3600, options));
            i += 1;
        });
    });

    group.bench_function("sweep_100k_none_expired", |b| {
        let mut store = Store::new();
        for i in 0..100_000 {
            store.set(format!("key:{}", i), "v".to_string(), SetOptions::default());
        }
        b.iter(|| black_box(store.sweep_expired()));
    });

    group.finish();
}

/// Benchmark KEYS pattern matching
fn bench_keys(c: &mut Criterion) {
    let db = Db::default();

    {
        let mut store = db.lock();
        for i in 0..1_000 {
            for prefix in ["user", "session", "cache"] {
                store.set(
                    format!("{}:{}", prefix, i),
                    "data".to_string(),
                    SetOptions::default(),
                );
            }
        }
    }

    let mut group = c.benchmark_group("keys");

    group.bench_function("keys_prefix", |b| {
        b.iter(|| {
            black_box(db.lock().keys("^user:").unwrap());
        });
    });

    group.bench_function("keys_all", |b| {
        b.iter(|| {
            black_box(db.lock().keys(".*").unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_dispatch,
    bench_concurrent,
    bench_expiry,
    bench_keys,
);

criterion_main!(benches);
