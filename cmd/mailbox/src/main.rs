//! Mailbox communication example
//!
//! Producers send tagged jobs to a consumer thread found by alias. The
//! consumer picks high-priority jobs first with selective receive, then
//! drains the rest in arrival order.

use enthread::closure::{ClosureEngine, Value};
use enthread::{
    InheritedContext, ThreadConfig, ThreadId, ThreadManager, ThreadOptions, ThreadResult,
};
use log::info;
use std::time::Instant;

const PRODUCERS: i64 = 3;
const JOBS_PER_PRODUCER: i64 = 5;

fn as_ball(e: enthread::ThreadError) -> Value {
    Value::string(&e.to_string())
}

fn job(priority: &str, n: i64) -> Value {
    Value::compound("job", vec![Value::atom(priority), Value::int(n)])
}

fn main() -> ThreadResult<()> {
    println!("=== Engine Thread Mailbox Example ===\n");

    enthread::init_logging();

    let config = ThreadConfig::default().max_threads(8);
    let manager = ThreadManager::new(ClosureEngine::new(), config)?;
    let main = manager.attach_main(InheritedContext::default())?;

    let consumer = main.create(
        ClosureEngine::goal(|ctx| {
            // Let every producer finish so both kinds of job are queued
            ctx.receive(|m| *m == Value::atom("start")).map_err(as_ball)?;

            let total = PRODUCERS * JOBS_PER_PRODUCER;
            let high = Value::compound("job", vec![Value::atom("high"), Value::Var]);

            let mut handled = 0;
            while ctx.peek(|m| m.matches(&high)).map_err(as_ball)?.is_some() {
                let j = ctx.receive(|m| m.matches(&high)).map_err(as_ball)?;
                println!("[Consumer] High first: {}", j);
                handled += 1;
            }
            while handled < total {
                let j = ctx.receive(|_| true).map_err(as_ball)?;
                println!("[Consumer] Received: {}", j);
                handled += 1;
            }
            ctx.exit(&Value::int(handled)).map_err(as_ball)?;
            Ok(false)
        }),
        ThreadOptions::new().alias("consumer"),
    )?;

    let start = Instant::now();
    let producers = (0..PRODUCERS)
        .map(|p| {
            main.create(
                ClosureEngine::goal(move |ctx| {
                    for i in 0..JOBS_PER_PRODUCER {
                        let priority = if i % 2 == 0 { "low" } else { "high" };
                        ctx.send("consumer", &job(priority, p * 100 + i)).map_err(as_ball)?;
                    }
                    Ok(true)
                }),
                ThreadOptions::new(),
            )
        })
        .collect::<ThreadResult<Vec<_>>>()?;

    for id in producers {
        main.join(id)?;
    }
    main.send(consumer, &Value::atom("start"))?;

    let status = main.join(consumer)?;
    info!("consumer {} finished in {:?}", consumer, start.elapsed());
    println!("\nConsumer status: {}", status);

    println!("Live threads: {}", manager.live_count());
    assert_eq!(main.self_id(), ThreadId::MAIN);

    println!("\n=== Example Complete ===");
    Ok(())
}
