//! # enthread-runtime
//!
//! Native OS threads for an interpreter engine.
//!
//! This crate provides:
//! - The thread registry (slot table, aliases, mailboxes) behind one lock
//! - Thread creation, join, exit and signalling
//! - Blocking selective receive between threads
//! - The `Engine` trait the runtime drives, plus a closure-based engine
//! - Configuration with environment overrides

pub mod config;
pub mod engine;
pub mod signal;
pub mod context;
mod registry;

// Re-exports
pub use config::ThreadConfig;
pub use context::{self_id, ThreadContext, ThreadInfo, ThreadManager, Threads};
pub use engine::{Engine, GoalOutcome, InheritedContext};
pub use signal::{parse_signal, Signal};
