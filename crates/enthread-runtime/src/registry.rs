//! Thread registry: fixed-capacity slot table behind the registry lock
//!
//! The table, the alias map and every mailbox queue are guarded by one
//! mutex. Nothing hands out references into the table: callers work on a
//! `SlotTable` through a short-lived guard and copy or move out what they
//! need before releasing it. Nothing blocks while holding the lock:
//! `receive` hands it over to the mailbox's wait signal before sleeping.

use crate::engine::Engine;
use crate::signal::{self, NativeThread, Signal};
use enthread_core::alias::AliasTable;
use enthread_core::cursor::EnumCursor;
use enthread_core::error::{ThreadError, ThreadResult};
use enthread_core::id::{ThreadId, ThreadRef};
use enthread_core::mailbox::{Mailbox, WaitSignal};
use enthread_core::options::{check_alias, StackSizes};
use enthread_core::status::ThreadStatus;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// How the OS thread of a live slot can be waited for
pub(crate) enum Join {
    /// Initial thread; not joinable through the registry
    Main,
    /// Spawned and not yet claimed by a joiner
    Pending(JoinHandle<()>),
    /// A joiner owns the handle and is blocked on it
    Joining,
}

/// OS side of a live slot
pub(crate) struct OsThread {
    pub native: NativeThread,
    pub join: Join,
}

enum SlotState {
    Free,
    /// Allocated by a `create` still inside its critical section
    Reserved,
    Live(OsThread),
}

/// Control block of one thread
pub(crate) struct Slot<E: Engine> {
    state: SlotState,
    status: ThreadStatus<E::Record>,
    alias: Option<String>,
    goal: Option<E::Goal>,
    stacks: Option<StackSizes>,
    mailbox: Mailbox<E::Record>,
}

impl<E: Engine> Slot<E> {
    fn free() -> Self {
        Self {
            state: SlotState::Free,
            status: ThreadStatus::Running,
            alias: None,
            goal: None,
            stacks: None,
            mailbox: Mailbox::new(),
        }
    }

    #[inline]
    fn is_free(&self) -> bool {
        matches!(self.state, SlotState::Free)
    }

    #[inline]
    fn is_live(&self) -> bool {
        matches!(self.state, SlotState::Live(_))
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn status(&self) -> &ThreadStatus<E::Record> {
        &self.status
    }
}

/// What a joiner takes out of a slot when freeing it
pub(crate) struct Reclaimed<E: Engine> {
    pub status: ThreadStatus<E::Record>,
    pub alias: Option<String>,
    pub undelivered: usize,
}

/// Slot table and alias map; only reachable through the registry lock
pub(crate) struct SlotTable<E: Engine> {
    slots: Vec<Slot<E>>,
    aliases: AliasTable,
}

impl<E: Engine> SlotTable<E> {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Reserve the lowest free slot from index 1 with a fresh mailbox and
    /// `Running` status
    pub fn allocate(&mut self) -> ThreadResult<ThreadId> {
        let capacity = self.capacity();
        let index = (1..capacity)
            .find(|&i| self.slots[i].is_free())
            .ok_or(ThreadError::ResourceExhausted { capacity })?;
        let slot = &mut self.slots[index];
        *slot = Slot::free();
        slot.state = SlotState::Reserved;
        Ok(ThreadId::new(index as u32))
    }

    /// Claim slot 0 for the initial thread
    pub fn claim_main(&mut self, native: NativeThread) -> ThreadResult<()> {
        let slot = &mut self.slots[0];
        if !slot.is_free() {
            return Err(ThreadError::InvalidOperation("initial thread already attached"));
        }
        *slot = Slot::free();
        slot.state = SlotState::Live(OsThread { native, join: Join::Main });
        Ok(())
    }

    /// Store the goal and stack sizes of a reserved slot
    pub fn prepare(&mut self, id: ThreadId, goal: E::Goal, stacks: StackSizes) {
        let slot = &mut self.slots[id.as_usize()];
        debug_assert!(matches!(slot.state, SlotState::Reserved));
        slot.goal = Some(goal);
        slot.stacks = Some(stacks);
    }

    /// Turn a reserved slot live once its OS thread exists
    pub fn publish(&mut self, id: ThreadId, handle: JoinHandle<()>) {
        let native = signal::native_of(&handle);
        self.slots[id.as_usize()].state = SlotState::Live(OsThread {
            native,
            join: Join::Pending(handle),
        });
    }

    /// Resolve an id or alias to a live slot id
    pub fn resolve(&self, target: &ThreadRef) -> ThreadResult<ThreadId> {
        let id = match target {
            ThreadRef::Id(id) => *id,
            ThreadRef::Alias(name) => self
                .aliases
                .resolve(name)
                .ok_or_else(|| ThreadError::not_found(name))?,
        };
        match self.slots.get(id.as_usize()) {
            Some(slot) if slot.is_live() => Ok(id),
            _ => Err(ThreadError::not_found(target)),
        }
    }

    /// Look up a live slot by id
    pub fn lookup(&self, id: ThreadId) -> ThreadResult<&Slot<E>> {
        self.slots
            .get(id.as_usize())
            .filter(|s| s.is_live())
            .ok_or_else(|| ThreadError::not_found(id))
    }

    fn lookup_mut(&mut self, id: ThreadId) -> ThreadResult<&mut Slot<E>> {
        self.slots
            .get_mut(id.as_usize())
            .filter(|s| s.is_live())
            .ok_or_else(|| ThreadError::not_found(id))
    }

    /// Bind `name` to the thread `id`
    ///
    /// A slot carries at most one alias. Binding a name held by another
    /// live thread fails with `AlreadyBound` and leaves both untouched.
    /// Works on reserved slots too, so `create` can bind before spawning.
    pub fn bind_alias(&mut self, id: ThreadId, name: &str) -> ThreadResult<()> {
        check_alias(name)?;
        let slot = self
            .slots
            .get(id.as_usize())
            .filter(|s| !s.is_free())
            .ok_or_else(|| ThreadError::not_found(id))?;
        match slot.alias.as_deref() {
            Some(current) if current == name => return Ok(()),
            Some(_) => return Err(ThreadError::InvalidOperation("thread already has an alias")),
            None => {}
        }
        if !self.aliases.bind(id, name) {
            return Err(ThreadError::AlreadyBound(name.to_string()));
        }
        self.slots[id.as_usize()].alias = Some(name.to_string());
        Ok(())
    }

    /// Return a reserved slot to the pool after a failed `create`
    pub fn rollback(&mut self, id: ThreadId) {
        let slot = &mut self.slots[id.as_usize()];
        if let Some(name) = slot.alias.take() {
            self.aliases.unbind(&name);
        }
        *slot = Slot::free();
    }

    /// Move the goal and stack sizes out of a slot for its own thread
    pub fn take_goal(&mut self, id: ThreadId) -> Option<(E::Goal, StackSizes)> {
        let slot = self.slots.get_mut(id.as_usize())?;
        Some((slot.goal.take()?, slot.stacks?))
    }

    /// Record the outcome of the thread owning `id`
    ///
    /// Only the owning thread calls this, once, right before returning
    /// from its start routine.
    pub fn finish(&mut self, id: ThreadId, status: ThreadStatus<E::Record>) {
        if let Some(slot) = self.slots.get_mut(id.as_usize()) {
            debug_assert!(!slot.status.is_terminal(), "status written twice");
            slot.status = status;
        }
    }

    /// Take the join handle of a spawned thread, marking it as being joined
    pub fn begin_join(&mut self, id: ThreadId) -> ThreadResult<JoinHandle<()>> {
        let slot = self.lookup_mut(id)?;
        let SlotState::Live(os) = &mut slot.state else {
            return Err(ThreadError::not_found(id));
        };
        match std::mem::replace(&mut os.join, Join::Joining) {
            Join::Pending(handle) => Ok(handle),
            other => {
                os.join = other;
                Err(ThreadError::not_found(id))
            }
        }
    }

    /// Free a slot whose OS thread has been joined, or slot 0
    ///
    /// Moves the status out, drops the alias binding, the goal and every
    /// undelivered message.
    pub fn reclaim(&mut self, id: ThreadId) -> Reclaimed<E> {
        let slot = std::mem::replace(&mut self.slots[id.as_usize()], Slot::free());
        if let Some(name) = slot.alias.as_deref() {
            self.aliases.unbind(name);
        }
        let undelivered = slot.mailbox.len();
        drop(slot.goal);
        drop(slot.mailbox.drain());
        Reclaimed {
            status: slot.status,
            alias: slot.alias,
            undelivered,
        }
    }

    /// Signal the OS thread of a live slot
    ///
    /// A thread whose status is terminal has left its start routine and is
    /// `NotFound`, even while its OS thread still accepts signals.
    pub fn kill(&self, id: ThreadId, sig: Option<Signal>) -> ThreadResult<()> {
        let slot = self.lookup(id)?;
        if slot.status.is_terminal() {
            return Err(ThreadError::not_found(id));
        }
        match &slot.state {
            SlotState::Live(OsThread {
                join: Join::Joining,
                ..
            }) => Err(ThreadError::not_found(id)),
            SlotState::Live(os) => signal::deliver(os.native, sig),
            _ => Err(ThreadError::not_found(id)),
        }
    }

    /// Append a message to the mailbox of a live thread
    ///
    /// Returns the mailbox's wait signal so the caller can notify after
    /// dropping the registry lock.
    pub fn post(&mut self, id: ThreadId, message: E::Record) -> ThreadResult<Arc<WaitSignal>> {
        let slot = self.lookup_mut(id)?;
        slot.mailbox.push(message);
        Ok(Arc::clone(slot.mailbox.signal()))
    }

    pub fn mailbox(&self, id: ThreadId) -> ThreadResult<&Mailbox<E::Record>> {
        self.lookup(id).map(|s| &s.mailbox)
    }

    fn mailbox_mut(&mut self, id: ThreadId) -> ThreadResult<&mut Mailbox<E::Record>> {
        self.lookup_mut(id).map(|s| &mut s.mailbox)
    }

    /// Advance a scan cursor to the next live slot
    pub fn next_live<T, F>(&self, cursor: &mut EnumCursor, mut view: F) -> Option<T>
    where
        F: FnMut(ThreadId, &Slot<E>) -> T,
    {
        cursor.advance(self.capacity(), |i| {
            let slot = &self.slots[i];
            slot.is_live().then(|| view(ThreadId::new(i as u32), slot))
        })
    }

    /// Number of live slots, slot 0 included when attached
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_live()).count()
    }
}

/// Registry: the slot table behind the process-wide registry lock
pub(crate) struct Registry<E: Engine> {
    table: Mutex<SlotTable<E>>,
}

impl<E: Engine> Registry<E> {
    pub fn new(capacity: usize) -> Self {
        Self {
            table: Mutex::new(SlotTable {
                slots: (0..capacity).map(|_| Slot::free()).collect(),
                aliases: AliasTable::new(),
            }),
        }
    }

    /// Take the registry lock
    ///
    /// A panic while holding the lock cannot leave the table half-updated
    /// in a way later callers would misread, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, SlotTable<E>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocking selective receive on the mailbox of `id`
    ///
    /// Scans from the head under the registry lock; on a miss, hands the
    /// lock over to the mailbox's wait signal and sleeps until a sender
    /// notifies, then rescans from the head. Messages already rejected by
    /// this call are tested again after every wakeup.
    pub fn receive<F, R>(&self, id: ThreadId, mut matcher: F) -> ThreadResult<(E::Record, R)>
    where
        F: FnMut(&E::Record) -> Option<R>,
    {
        let mut table = self.lock();
        loop {
            let mailbox = table.mailbox_mut(id)?;
            if let Some(hit) = mailbox.take_first_map(&mut matcher) {
                return Ok(hit);
            }
            let signal = Arc::clone(mailbox.signal());
            signal.release_and_wait(table);
            table = self.lock();
        }
    }

    /// Non-blocking, non-removing scan of the mailbox of `id`
    pub fn peek<F, R>(&self, id: ThreadId, matcher: F) -> ThreadResult<Option<R>>
    where
        F: FnMut(&E::Record) -> Option<R>,
    {
        let table = self.lock();
        Ok(table.mailbox(id)?.find_map(matcher))
    }

    /// Append `message` to the mailbox of `target` and wake its receiver
    pub fn send(&self, target: &ThreadRef, message: E::Record) -> ThreadResult<ThreadId> {
        let (id, signal) = {
            let mut table = self.lock();
            let id = table.resolve(target)?;
            (id, table.post(id, message)?)
        };
        signal.notify();
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::closure::{ClosureEngine, Value};

    fn spawn_parked() -> (JoinHandle<()>, std::sync::mpsc::Sender<()>) {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let handle = std::thread::spawn(move || {
            let _ = rx.recv();
        });
        (handle, tx)
    }

    #[test]
    fn test_allocate_lowest_from_one() {
        let reg = Registry::<ClosureEngine>::new(4);
        let mut table = reg.lock();

        assert_eq!(table.allocate().unwrap(), ThreadId::new(1));
        assert_eq!(table.allocate().unwrap(), ThreadId::new(2));
        table.rollback(ThreadId::new(1));
        assert_eq!(table.allocate().unwrap(), ThreadId::new(1));
    }

    #[test]
    fn test_allocate_exhaustion() {
        let reg = Registry::<ClosureEngine>::new(3);
        let mut table = reg.lock();

        table.allocate().unwrap();
        table.allocate().unwrap();
        let result = table.allocate();
        assert_eq!(result, Err(ThreadError::ResourceExhausted { capacity: 3 }));
    }

    #[test]
    fn test_reserved_slot_is_not_live() {
        let reg = Registry::<ClosureEngine>::new(3);
        let mut table = reg.lock();

        let id = table.allocate().unwrap();
        assert!(table.lookup(id).is_err());
        assert!(table.resolve(&ThreadRef::Id(id)).is_err());
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn test_lookup_out_of_range() {
        let reg = Registry::<ClosureEngine>::new(3);
        let table = reg.lock();
        assert!(matches!(table.lookup(ThreadId::new(99)), Err(e) if e.is_not_found()));
        assert!(table.lookup(ThreadId::NONE).is_err());
    }

    #[test]
    fn test_alias_collision_between_slots() {
        let reg = Registry::<ClosureEngine>::new(4);
        let mut table = reg.lock();
        let a = table.allocate().unwrap();
        let b = table.allocate().unwrap();

        table.bind_alias(a, "worker").unwrap();
        assert_eq!(
            table.bind_alias(b, "worker"),
            Err(ThreadError::AlreadyBound("worker".into()))
        );
        assert_eq!(table.slots[a.as_usize()].alias(), Some("worker"));
        assert_eq!(table.slots[b.as_usize()].alias(), None);
        assert!(table.bind_alias(a, "other").is_err());
    }

    #[test]
    fn test_bind_alias_rejects_nul_and_empty() {
        let reg = Registry::<ClosureEngine>::new(3);
        let mut table = reg.lock();
        let a = table.allocate().unwrap();

        assert!(matches!(table.bind_alias(a, "a\0b"), Err(ThreadError::InvalidOption(_))));
        assert!(matches!(table.bind_alias(a, ""), Err(ThreadError::InvalidOption(_))));
        assert_eq!(table.slots[a.as_usize()].alias(), None);
        assert!(table.bind_alias(a, "ab").is_ok());
    }

    #[test]
    fn test_rollback_releases_alias() {
        let reg = Registry::<ClosureEngine>::new(4);
        let mut table = reg.lock();
        let a = table.allocate().unwrap();
        table.bind_alias(a, "temp").unwrap();
        table.rollback(a);

        let b = table.allocate().unwrap();
        assert!(table.bind_alias(b, "temp").is_ok());
    }

    #[test]
    fn test_publish_join_reclaim_cycle() {
        let reg = Registry::<ClosureEngine>::new(4);
        let (handle, tx) = spawn_parked();

        let id = {
            let mut table = reg.lock();
            let id = table.allocate().unwrap();
            table.bind_alias(id, "parked").unwrap();
            table.publish(id, handle);
            id
        };
        assert_eq!(reg.lock().resolve(&ThreadRef::from("parked")).unwrap(), id);

        reg.send(&ThreadRef::Id(id), Value::int(1)).unwrap();
        let handle = reg.lock().begin_join(id).unwrap();
        assert!(reg.lock().begin_join(id).is_err());
        assert!(reg.lock().kill(id, None).is_err());

        tx.send(()).unwrap();
        handle.join().unwrap();

        let mut table = reg.lock();
        table.finish(id, ThreadStatus::Succeeded);
        let reclaimed = table.reclaim(id);
        assert_eq!(reclaimed.status, ThreadStatus::Succeeded);
        assert_eq!(reclaimed.alias.as_deref(), Some("parked"));
        assert_eq!(reclaimed.undelivered, 1);
        assert!(table.resolve(&ThreadRef::from("parked")).is_err());
        assert!(table.lookup(id).is_err());
    }

    #[test]
    fn test_main_slot_not_joinable() {
        let reg = Registry::<ClosureEngine>::new(2);
        let mut table = reg.lock();
        table.claim_main(signal::current_native()).unwrap();

        assert!(table.lookup(ThreadId::MAIN).is_ok());
        assert!(table.begin_join(ThreadId::MAIN).is_err());
        assert!(table.claim_main(signal::current_native()).is_err());
        assert!(table.kill(ThreadId::MAIN, None).is_ok());
    }

    #[test]
    fn test_next_live_skips_free_slots() {
        let reg = Registry::<ClosureEngine>::new(5);
        let mut parked = vec![];
        {
            let mut table = reg.lock();
            for _ in 0..3 {
                let (handle, tx) = spawn_parked();
                let id = table.allocate().unwrap();
                table.publish(id, handle);
                parked.push((id, tx));
            }
        }
        let freed = parked.remove(1);
        let handle = reg.lock().begin_join(freed.0).unwrap();
        freed.1.send(()).unwrap();
        handle.join().unwrap();
        reg.lock().reclaim(freed.0);

        let mut cursor = EnumCursor::all();
        let mut seen = vec![];
        while let Some(id) = reg.lock().next_live(&mut cursor, |id, _| id) {
            seen.push(id.as_u32());
        }
        assert_eq!(seen, vec![1, 3]);

        for (id, tx) in parked {
            let handle = reg.lock().begin_join(id).unwrap();
            tx.send(()).unwrap();
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_peek_then_receive_same_message() {
        let reg = Registry::<ClosureEngine>::new(2);
        reg.lock().claim_main(signal::current_native()).unwrap();
        reg.send(&ThreadRef::Id(ThreadId::MAIN), Value::atom("a")).unwrap();
        reg.send(&ThreadRef::Id(ThreadId::MAIN), Value::int(7)).unwrap();

        let is_int = |v: &Value| matches!(v, Value::Int(_)).then(|| v.clone());
        let peeked = reg.peek(ThreadId::MAIN, is_int).unwrap();
        let (received, _) = reg.receive(ThreadId::MAIN, is_int).unwrap();
        assert_eq!(peeked, Some(received));

        let (rest, _) = reg.receive(ThreadId::MAIN, |_| Some(())).unwrap();
        assert_eq!(rest, Value::atom("a"));
        assert_eq!(reg.peek(ThreadId::MAIN, |_| Some(())).unwrap(), None);
    }
}
