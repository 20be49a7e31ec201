//! Thread lifecycle: manager, per-thread context and start routine
//!
//! Every engine thread, the initial one included, owns a `ThreadContext`.
//! It names the caller's slot and carries the settings a thread passes on
//! to the threads it creates. All thread operations are methods on it, so
//! nothing depends on ambient per-thread state.
//!
//! `exit` unwinds the calling thread back to its start routine (frames are
//! unwound, not skipped). Builds with `panic = "abort"` cannot use it.

use crate::config::ThreadConfig;
use crate::engine::{Engine, GoalOutcome, InheritedContext};
use crate::registry::{Registry, Slot};
use crate::signal::{self, Signal};
use enthread_core::cursor::EnumCursor;
use enthread_core::error::{ThreadError, ThreadResult};
use enthread_core::id::{ThreadId, ThreadRef};
use enthread_core::options::{StackSizes, ThreadOptions};
use enthread_core::status::ThreadStatus;
use log::{debug, error, trace, warn};
use std::any::Any;
use std::cell::{Ref, RefCell};
use std::convert::Infallible;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

/// State shared by every thread of one manager
pub(crate) struct Shared<E: Engine> {
    engine: E,
    config: ThreadConfig,
    registry: Registry<E>,
}

/// Handle on a thread registry and its engine
///
/// Cheap to clone. Creating one does not attach any thread; call
/// `attach_main` on the initial thread to get its context.
pub struct ThreadManager<E: Engine> {
    shared: Arc<Shared<E>>,
}

impl<E: Engine> Clone for ThreadManager<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: Engine> ThreadManager<E> {
    pub fn new(engine: E, config: ThreadConfig) -> ThreadResult<Self> {
        config.validate()?;
        debug!("thread registry: {} slots", config.max_threads);
        Ok(Self {
            shared: Arc::new(Shared {
                registry: Registry::new(config.max_threads),
                engine,
                config,
            }),
        })
    }

    /// Bind slot 0 to the calling OS thread and return its context
    ///
    /// Fails with `InvalidOperation` while another initial context exists.
    /// Dropping the returned context frees slot 0 again.
    pub fn attach_main(
        &self,
        inherited: InheritedContext<E::Streams>,
    ) -> ThreadResult<ThreadContext<E>> {
        self.shared.registry.lock().claim_main(signal::current_native())?;
        let stacks = self.shared.config.default_stacks;
        Ok(ThreadContext::new(ThreadId::MAIN, Arc::clone(&self.shared), stacks, inherited))
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.shared.engine
    }

    #[inline]
    pub fn config(&self) -> &ThreadConfig {
        &self.shared.config
    }

    /// Registry capacity, slot 0 included
    pub fn capacity(&self) -> usize {
        self.shared.config.max_threads
    }

    /// Number of live threads, the initial thread included when attached
    pub fn live_count(&self) -> usize {
        self.shared.registry.lock().live_count()
    }
}

/// One entry of a thread enumeration
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadInfo<T> {
    pub id: ThreadId,
    pub alias: Option<String>,
    /// Status with a copy of the payload, if any
    pub status: ThreadStatus<T>,
}

impl<T> ThreadInfo<T> {
    /// How the thread is displayed: its alias if bound, else its id
    pub fn handle(&self) -> ThreadRef {
        match &self.alias {
            Some(name) => ThreadRef::Alias(name.clone()),
            None => ThreadRef::Id(self.id),
        }
    }
}

/// Unwind payload carrying an `exit` value to the start routine
struct ExitRequest<R> {
    payload: R,
}

/// The calling thread's view of the registry
///
/// Not `Send`: a context belongs to the OS thread it was made for.
pub struct ThreadContext<E: Engine> {
    id: ThreadId,
    shared: Arc<Shared<E>>,
    stacks: StackSizes,
    inherited: RefCell<InheritedContext<E::Streams>>,
    _not_send: PhantomData<*const ()>,
}

/// Id of the thread owning `ctx`, or `ThreadId::NONE` without one
pub fn self_id<E: Engine>(ctx: Option<&ThreadContext<E>>) -> ThreadId {
    ctx.map_or(ThreadId::NONE, ThreadContext::self_id)
}

impl<E: Engine> ThreadContext<E> {
    fn new(
        id: ThreadId,
        shared: Arc<Shared<E>>,
        stacks: StackSizes,
        inherited: InheritedContext<E::Streams>,
    ) -> Self {
        Self {
            id,
            shared,
            stacks,
            inherited: RefCell::new(inherited),
            _not_send: PhantomData,
        }
    }

    #[inline]
    pub fn self_id(&self) -> ThreadId {
        self.id
    }

    pub fn manager(&self) -> ThreadManager<E> {
        ThreadManager {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Engine stack sizes this thread was started with
    #[inline]
    pub fn stacks(&self) -> &StackSizes {
        &self.stacks
    }

    /// Settings new threads will copy from this one
    pub fn inherited(&self) -> Ref<'_, InheritedContext<E::Streams>> {
        self.inherited.borrow()
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.inherited.borrow_mut().prompt = prompt.into();
    }

    pub fn set_module(&self, module: impl Into<String>) {
        self.inherited.borrow_mut().module = module.into();
    }

    pub fn set_streams(&self, streams: E::Streams) {
        self.inherited.borrow_mut().streams = streams;
    }

    pub fn set_file_errors(&self, enabled: bool) {
        self.inherited.borrow_mut().file_errors = enabled;
    }

    pub fn set_float_format(&self, format: impl Into<String>) {
        self.inherited.borrow_mut().float_format = format.into();
    }

    /// Create a thread running `goal`
    ///
    /// The goal is moved into the new slot. The new thread starts with a
    /// copy of this thread's inherited settings and runs the goal in this
    /// thread's current module. If the alias cannot be bound or the OS
    /// refuses to spawn, the slot is released before the error returns.
    pub fn create(&self, goal: E::Goal, options: ThreadOptions) -> ThreadResult<ThreadId> {
        let shared = &self.shared;
        options.validate()?;
        let stacks = options.resolve_stacks(&shared.config.default_stacks)?;
        let inherited = self.inherited.borrow().clone();

        // Held across the spawn: the new thread's first step takes this
        // lock, so it cannot run before its slot is published.
        let mut table = shared.registry.lock();
        let id = table.allocate()?;
        if let Some(name) = options.alias.as_deref() {
            if let Err(e) = table.bind_alias(id, name) {
                table.rollback(id);
                return Err(e);
            }
        }
        table.prepare(id, goal, stacks);

        // Builder::spawn panics on a NUL in the name
        let name = match &options.alias {
            Some(alias) if !alias.contains('\0') => format!("enthread-{}", alias),
            _ => format!("enthread-{}", id),
        };
        let worker = Arc::clone(shared);
        let spawned = thread::Builder::new()
            .name(name)
            .stack_size(shared.config.os_stack_size)
            .spawn(move || start_routine(worker, id, inherited));

        match spawned {
            Ok(handle) => {
                table.publish(id, handle);
                debug!("thread {} created by {} (alias {:?})", id, self.id, options.alias);
                Ok(id)
            }
            Err(e) => {
                table.rollback(id);
                warn!("could not create thread: {}", e);
                Err(ThreadError::OsFailure(format!("could not create thread: {}", e)))
            }
        }
    }

    /// Wait for a thread to terminate and reclaim its slot
    ///
    /// Returns the terminal status; its payload (if any) now belongs to
    /// the caller. The alias, the goal and undelivered messages are
    /// released. A second join of the same thread fails with `NotFound`.
    pub fn join(&self, target: impl Into<ThreadRef>) -> ThreadResult<ThreadStatus<E::Term>> {
        let target = target.into();
        let registry = &self.shared.registry;
        let (id, handle) = {
            let mut table = registry.lock();
            let id = table.resolve(&target)?;
            if id == self.id {
                return Err(ThreadError::InvalidOperation("a thread cannot join itself"));
            }
            (id, table.begin_join(id)?)
        };

        let joined = handle.join();
        let reclaimed = registry.lock().reclaim(id);
        if joined.is_err() {
            error!("thread {} unwound past its start routine", id);
        }
        if !reclaimed.status.is_terminal() {
            return Err(ThreadError::Fatal(format!("thread {} ended without a status", id)));
        }
        debug!(
            "thread {} (alias {:?}) joined by {}: {} ({} undelivered messages dropped)",
            id,
            reclaimed.alias,
            self.id,
            reclaimed.status.kind(),
            reclaimed.undelivered
        );

        let engine = &self.shared.engine;
        Ok(reclaimed.status.map(|record| engine.recorded(&record)))
    }

    /// End the calling thread with status `Exited(payload)`
    ///
    /// Does not return on success. Fails with `InvalidOperation` on the
    /// initial thread, which has no start routine to return to.
    pub fn exit(&self, payload: &E::Term) -> ThreadResult<Infallible> {
        if self.id.is_main() {
            return Err(ThreadError::InvalidOperation("the initial thread cannot exit"));
        }
        let record = self.shared.engine.record(payload);
        debug!("thread {} exiting", self.id);
        panic::resume_unwind(Box::new(ExitRequest { payload: record }))
    }

    /// Deliver `sig` to a thread; `None` only checks that it is alive
    ///
    /// A target that has already terminated is `NotFound`.
    pub fn kill(
        &self,
        target: impl Into<ThreadRef>,
        sig: impl Into<Option<Signal>>,
    ) -> ThreadResult<()> {
        let target = target.into();
        let sig = sig.into();
        let table = self.shared.registry.lock();
        let id = table.resolve(&target)?;
        table.kill(id, sig).map_err(|e| match e {
            ThreadError::NotFound(_) => ThreadError::not_found(&target),
            other => {
                error!("signal {:?} to thread {} failed: {}", sig, id, other);
                other
            }
        })
    }

    /// Queue a copy of `message` in the mailbox of `target`
    pub fn send(&self, target: impl Into<ThreadRef>, message: &E::Term) -> ThreadResult<()> {
        let record = self.shared.engine.record(message);
        let id = self.shared.registry.send(&target.into(), record)?;
        trace!("message {} -> {}", self.id, id);
        Ok(())
    }

    /// Remove and return the first message of this thread's mailbox that
    /// `pattern` accepts, blocking until one arrives
    pub fn receive<F>(&self, mut pattern: F) -> ThreadResult<E::Term>
    where
        F: FnMut(&E::Term) -> bool,
    {
        let engine = &self.shared.engine;
        let (_record, term) = self.shared.registry.receive(self.id, |record| {
            let term = engine.recorded(record);
            pattern(&term).then_some(term)
        })?;
        trace!("thread {} received a message", self.id);
        Ok(term)
    }

    /// Return a copy of the first message `pattern` accepts without
    /// removing it; `None` if there is none
    pub fn peek<F>(&self, mut pattern: F) -> ThreadResult<Option<E::Term>>
    where
        F: FnMut(&E::Term) -> bool,
    {
        let engine = &self.shared.engine;
        self.shared.registry.peek(self.id, |record| {
            let term = engine.recorded(record);
            pattern(&term).then_some(term)
        })
    }

    /// Give the live thread `id` the alias `name`
    pub fn bind_alias(&self, id: ThreadId, name: &str) -> ThreadResult<()> {
        let mut table = self.shared.registry.lock();
        table.lookup(id)?;
        table.bind_alias(id, name)
    }

    /// Id, alias and status of one live thread
    pub fn thread_info(&self, target: impl Into<ThreadRef>) -> ThreadResult<ThreadInfo<E::Term>> {
        let table = self.shared.registry.lock();
        let id = table.resolve(&target.into())?;
        let slot = table.lookup(id)?;
        Ok(self.info_of(id, slot))
    }

    /// One step of an enumeration
    ///
    /// A lookup cursor yields its thread once (or `NotFound`); a scan
    /// cursor yields the next live thread above its position. Each step
    /// locks the registry on its own, see `EnumCursor`.
    pub fn current_thread(
        &self,
        cursor: &mut EnumCursor,
    ) -> ThreadResult<Option<ThreadInfo<E::Term>>> {
        if cursor.filter().is_some() {
            return match cursor.take_lookup().cloned() {
                Some(target) => self.thread_info(target).map(Some),
                None => Ok(None),
            };
        }
        let table = self.shared.registry.lock();
        Ok(table.next_live(cursor, |id, slot| self.info_of(id, slot)))
    }

    /// Lazily enumerate live threads in ascending id order
    pub fn threads(&self) -> Threads<'_, E> {
        Threads {
            ctx: self,
            cursor: EnumCursor::all(),
        }
    }

    fn info_of(&self, id: ThreadId, slot: &Slot<E>) -> ThreadInfo<E::Term> {
        let engine = &self.shared.engine;
        ThreadInfo {
            id,
            alias: slot.alias().map(str::to_string),
            status: slot.status().as_ref().map(|record| engine.recorded(record)),
        }
    }
}

impl<E: Engine> Drop for ThreadContext<E> {
    fn drop(&mut self) {
        if self.id.is_main() {
            self.shared.registry.lock().reclaim(ThreadId::MAIN);
        }
    }
}

/// Iterator over live threads, see `ThreadContext::threads`
pub struct Threads<'a, E: Engine> {
    ctx: &'a ThreadContext<E>,
    cursor: EnumCursor,
}

impl<'a, E: Engine> Iterator for Threads<'a, E> {
    type Item = ThreadInfo<E::Term>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ctx.current_thread(&mut self.cursor).ok().flatten()
    }
}

/// Body of every spawned OS thread
fn start_routine<E: Engine>(
    shared: Arc<Shared<E>>,
    id: ThreadId,
    inherited: InheritedContext<E::Streams>,
) {
    let taken = shared.registry.lock().take_goal(id);
    let Some((goal, stacks)) = taken else {
        error!("thread {} started without a goal", id);
        return;
    };

    let ctx = ThreadContext::new(id, Arc::clone(&shared), stacks, inherited);
    let status = run_goal(&ctx, goal);
    debug!("thread {} finished: {}", id, status.kind());
    shared.registry.lock().finish(id, status);
}

/// Set up the engine, run the goal and map how it ended to a status
///
/// Payloads are captured before the engine is torn down.
fn run_goal<E: Engine>(ctx: &ThreadContext<E>, goal: E::Goal) -> ThreadStatus<E::Record> {
    let engine = &ctx.shared.engine;
    if let Err(e) = engine.init_engine(&ctx.stacks, &ctx.inherited()) {
        warn!("thread {}: engine init failed: {}", ctx.id, e);
        let message = format!("engine init failed: {}", e);
        return ThreadStatus::Exception(engine.error_exception(&message));
    }

    let module = ctx.inherited().module.clone();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| engine.invoke_goal(ctx, &module, goal)));
    let status = match outcome {
        Ok(GoalOutcome::True) => ThreadStatus::Succeeded,
        Ok(GoalOutcome::False) => ThreadStatus::Failed,
        Ok(GoalOutcome::Exception(ball)) => ThreadStatus::Exception(ball),
        Err(unwound) => match unwound.downcast::<ExitRequest<E::Record>>() {
            Ok(exit) => ThreadStatus::Exited(exit.payload),
            Err(panicked) => {
                let message = panic_message(panicked.as_ref());
                warn!("thread {} panicked: {}", ctx.id, message);
                ThreadStatus::Exception(engine.error_exception(&message))
            }
        },
    };
    engine.teardown_engine();
    status
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
