//! # enthread-core
//!
//! Core types for native engine threads: identifiers, the status state
//! machine, mailboxes, the alias table and the enumeration cursor.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! Thread spawning, signals and the shared registry live in
//! `enthread-runtime`.
//!
//! ## Modules
//!
//! - `id` - Thread identifier and id-or-alias references
//! - `status` - Thread status state machine
//! - `mailbox` - Per-thread message queue with selective receive
//! - `alias` - Name -> id table
//! - `cursor` - Resumable enumeration cursor
//! - `options` - Creation options and engine stack sizes
//! - `error` - Error types
//! - `logging` - Stderr backend for the `log` facade

pub mod id;
pub mod status;
pub mod mailbox;
pub mod alias;
pub mod cursor;
pub mod options;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use id::{ThreadId, ThreadRef};
pub use status::{StatusKind, ThreadStatus};
pub use mailbox::{Mailbox, WaitSignal};
pub use alias::AliasTable;
pub use cursor::EnumCursor;
pub use options::{StackSizes, ThreadOptions};
pub use error::{ThreadError, ThreadResult};
