//! Mailbox throughput: send/receive round trips through the registry

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use enthread_core::{ThreadId, ThreadOptions};
use enthread_runtime::engine::closure::{ClosureEngine, Value};
use enthread_runtime::{InheritedContext, ThreadConfig, ThreadManager};

fn bench_self_send(c: &mut Criterion) {
    let manager = ThreadManager::new(ClosureEngine::new(), ThreadConfig::new().max_threads(4))
        .expect("config");
    let main = manager.attach_main(InheritedContext::default()).expect("attach");
    let msg = Value::compound("job", vec![Value::int(1), Value::atom("x")]);

    c.bench_function("self_send_receive", |b| {
        b.iter(|| {
            main.send(ThreadId::MAIN, &msg).unwrap();
            main.receive(|_| true).unwrap()
        })
    });
}

fn bench_selective(c: &mut Criterion) {
    let manager = ThreadManager::new(ClosureEngine::new(), ThreadConfig::new().max_threads(4))
        .expect("config");
    let main = manager.attach_main(InheritedContext::default()).expect("attach");
    let want = Value::atom("wanted");

    let mut group = c.benchmark_group("selective_receive");
    for skipped in [0usize, 16, 256] {
        for i in 0..skipped {
            main.send(ThreadId::MAIN, &Value::int(i as i64)).unwrap();
        }
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(skipped), &skipped, |b, _| {
            b.iter(|| {
                main.send(ThreadId::MAIN, &want).unwrap();
                main.receive(|m| *m == want).unwrap()
            })
        });
        while main.peek(|_| true).unwrap().is_some() {
            main.receive(|_| true).unwrap();
        }
    }
    group.finish();
}

fn bench_ping_pong(c: &mut Criterion) {
    let manager = ThreadManager::new(ClosureEngine::new(), ThreadConfig::new().max_threads(4))
        .expect("config");
    let main = manager.attach_main(InheritedContext::default()).expect("attach");
    let echo = main
        .create(
            ClosureEngine::goal(|ctx| loop {
                let msg = ctx.receive(|_| true).map_err(|e| Value::string(&e.to_string()))?;
                if msg == Value::atom("stop") {
                    return Ok(true);
                }
                ctx.send(ThreadId::MAIN, &msg).map_err(|e| Value::string(&e.to_string()))?;
            }),
            ThreadOptions::new().alias("echo"),
        )
        .expect("create");

    c.bench_function("ping_pong", |b| {
        b.iter(|| {
            main.send(echo, &Value::int(7)).unwrap();
            main.receive(|_| true).unwrap()
        })
    });

    main.send(echo, &Value::atom("stop")).unwrap();
    main.join(echo).unwrap();
}

criterion_group!(benches, bench_self_send, bench_selective, bench_ping_pong);
criterion_main!(benches);
