//! Basic engine thread example
//!
//! Creates a few threads that end in each possible way, lists them while
//! they run, then joins them and prints their status.
//!
//! # Environment Variables
//!
//! - `ENT_FLUSH_EPRINT=1` - Flush log output immediately
//! - `ENT_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `ENT_MAX_THREADS=16` - Registry capacity

use enthread::closure::{ClosureEngine, Value};
use enthread::{
    InheritedContext, Signal, ThreadConfig, ThreadId, ThreadManager, ThreadOptions,
    ThreadResult,
};
use log::{debug, info};

// ENT_LOG_LEVEL=debug ENT_FLUSH_EPRINT=1 cargo run -p enthread-basic
fn main() -> ThreadResult<()> {
    println!("=== Engine Thread Basic Example ===\n");

    enthread::init_logging();

    let manager = ThreadManager::new(ClosureEngine::new(), ThreadConfig::default())?;
    let main = manager.attach_main(InheritedContext::default())?;
    main.set_module("demo");

    let mut ids = Vec::new();

    // One thread per terminal status
    ids.push(main.create(
        ClosureEngine::goal(|ctx| {
            debug!("[{}] succeeding", ctx.self_id());
            Ok(true)
        }),
        ThreadOptions::new().alias("ok"),
    )?);
    ids.push(main.create(ClosureEngine::goal(|_| Ok(false)), ThreadOptions::new().alias("fail"))?);
    ids.push(main.create(
        ClosureEngine::goal(|_| Err(Value::compound("error", vec![Value::atom("demo")]))),
        ThreadOptions::new().alias("raise"),
    )?);
    ids.push(main.create(
        ClosureEngine::goal(|ctx| {
            let module = ctx.inherited().module.clone();
            ctx.exit(&Value::compound("bye", vec![Value::atom(&module)]))
                .map_err(|e| Value::string(&e.to_string()))?;
            Ok(false)
        }),
        ThreadOptions::new().alias("leaver").local_kb(512),
    )?);

    // A thread that waits to be told to stop
    let sleeper = main.create(
        ClosureEngine::goal(|ctx| {
            ctx.receive(|m| *m == Value::atom("stop"))
                .map_err(|e| Value::string(&e.to_string()))?;
            Ok(true)
        }),
        ThreadOptions::new(),
    )?;
    ids.push(sleeper);

    println!("Created {} threads: {:?}\n", ids.len(), ids);

    println!("{:<6} {:<10} {}", "id", "alias", "status");
    for info in main.threads() {
        println!(
            "{:<6} {:<10} {}",
            info.id,
            info.alias.as_deref().unwrap_or("-"),
            info.status
        );
    }

    // SIGURG is ignored by default; this only shows the thread is alive
    main.kill(sleeper, Signal::SIGURG)?;
    main.send(sleeper, &Value::atom("stop"))?;

    println!();
    for id in ids {
        let status = main.join(id)?;
        println!("Thread {} ended: {}", id, status);
    }

    info!("{} live thread(s) left", manager.live_count());
    assert_eq!(enthread::self_id(Some(&main)), ThreadId::MAIN);

    println!("\n=== Example Complete ===");
    Ok(())
}
