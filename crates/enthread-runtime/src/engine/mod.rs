//! Interface to the interpreter engine
//!
//! The thread runtime never looks inside terms or goals. Everything it
//! needs from the engine goes through the `Engine` trait: turning terms
//! into independently owned records and back, setting up and tearing
//! down the per-thread engine, and running a goal to one of three
//! outcomes.

pub mod closure;

use crate::context::ThreadContext;
use enthread_core::error::ThreadResult;
use enthread_core::options::StackSizes;

/// Result of running a goal once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalOutcome<R> {
    True,
    False,
    /// Uncaught exception, already recorded
    Exception(R),
}

/// Per-thread settings a new thread copies from its creator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritedContext<S> {
    pub prompt: String,
    /// Module goals are run in
    pub module: String,
    pub streams: S,
    /// Whether file errors raise exceptions
    pub file_errors: bool,
    pub float_format: String,
}

impl<S: Default> Default for InheritedContext<S> {
    fn default() -> Self {
        Self {
            prompt: "|: ".to_string(),
            module: "user".to_string(),
            streams: S::default(),
            file_errors: true,
            float_format: "%15g".to_string(),
        }
    }
}

/// Engine collaborator used by the thread runtime
///
/// Implementations must be shareable between threads: one engine value
/// serves every thread of a `ThreadManager`, and per-thread state is set
/// up by `init_engine` on the thread that will use it.
pub trait Engine: Send + Sync + Sized + 'static {
    /// Work item handed to a new thread; owned by its slot until run
    type Goal: Send + 'static;

    /// Engine value as seen by callers
    type Term;

    /// Recorded copy of a term, owned independently of any engine stack
    type Record: Send + 'static;

    /// Stream set inherited by value from the creating thread
    type Streams: Clone + Send + 'static;

    fn record(&self, term: &Self::Term) -> Self::Record;

    fn recorded(&self, record: &Self::Record) -> Self::Term;

    /// Set up engine-local state on the calling OS thread
    fn init_engine(
        &self,
        stacks: &StackSizes,
        inherited: &InheritedContext<Self::Streams>,
    ) -> ThreadResult<()>;

    /// Run `goal` in `module`, catching exceptions
    fn invoke_goal(
        &self,
        ctx: &ThreadContext<Self>,
        module: &str,
        goal: Self::Goal,
    ) -> GoalOutcome<Self::Record>;

    /// Release engine-local state of the calling OS thread
    fn teardown_engine(&self);

    /// Build an exception record for a failure outside the goal's own
    /// exception handling: engine init errors and Rust panics
    fn error_exception(&self, message: &str) -> Self::Record;
}
