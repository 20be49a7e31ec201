//! # enthread - Native threads for an interpreter engine
//!
//! Each engine thread is a real OS thread with its own engine state. The
//! initial thread and every thread it creates share one fixed-capacity
//! registry, addressed by small integer ids or by aliases.
//!
//! ## Features
//!
//! - **Lifecycle**: create, join, exit, with a status per thread
//!   (`running`, `true`, `false`, `exception(E)`, `exited(T)`)
//! - **Aliases**: optional unique names, bound at creation or later
//! - **Mailboxes**: FIFO queue per thread with blocking selective receive
//!   and non-removing peek
//! - **Signals**: asynchronous signal delivery to a live thread
//! - **Enumeration**: resumable walk over live threads
//!
//! ## Quick Start
//!
//! ```ignore
//! use enthread::closure::{ClosureEngine, Value};
//! use enthread::{InheritedContext, ThreadConfig, ThreadId, ThreadManager, ThreadOptions};
//!
//! fn main() -> enthread::ThreadResult<()> {
//!     enthread::init_logging();
//!
//!     let manager = ThreadManager::new(ClosureEngine::new(), ThreadConfig::default())?;
//!     let main = manager.attach_main(InheritedContext::default())?;
//!
//!     let id = main.create(
//!         ClosureEngine::goal(|ctx| {
//!             ctx.send(ThreadId::MAIN, &Value::atom("hello"))
//!                 .map_err(|e| Value::string(&e.to_string()))?;
//!             Ok(true)
//!         }),
//!         ThreadOptions::new().alias("greeter"),
//!     )?;
//!
//!     let msg = main.receive(|m| m.matches(&Value::atom("hello")))?;
//!     println!("got {}, status {}", msg, main.join(id)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Engine / User Code                     │
//! │      create, join, exit, kill, send, receive, threads       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ThreadContext                          │
//! │      caller id, inherited settings, engine stack sizes      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Registry (one mutex)                        │
//! │   slot table  ·  alias map  ·  per-slot mailbox queues      │
//! └─────────────────────────────────────────────────────────────┘
//!          │                   │                   │
//!          ▼                   ▼                   ▼
//!    ┌───────────┐      ┌───────────┐      ┌───────────┐
//!    │  slot 0   │      │  slot 1   │      │  slot N   │
//!    │  initial  │      │ OS thread │      │ OS thread │
//!    └───────────┘      └───────────┘      └───────────┘
//! ```
//!
//! `exit` unwinds the calling thread; the crate needs `panic = "unwind"`.

// Re-export core types
pub use enthread_core::{
    AliasTable,
    EnumCursor,
    Mailbox,
    StackSizes,
    StatusKind,
    ThreadError,
    ThreadId,
    ThreadOptions,
    ThreadRef,
    ThreadResult,
    ThreadStatus,
};

// Logging backend for binaries without their own logger
pub use enthread_core::logging::{
    init as init_logging, parse_level, set_flush_enabled, set_log_level,
};
pub use log::LevelFilter;

// Re-export runtime types
pub use enthread_runtime::{
    parse_signal,
    self_id,
    Engine,
    GoalOutcome,
    InheritedContext,
    Signal,
    ThreadConfig,
    ThreadContext,
    ThreadInfo,
    ThreadManager,
    Threads,
};

/// Reference engine running Rust closures as goals
pub mod closure {
    pub use enthread_runtime::engine::closure::{ClosureEngine, Goal, GoalResult, Value};
}
