//! Per-thread mailbox with selective receive
//!
//! A `Mailbox` is a plain FIFO of owned messages. It has no lock of its
//! own for the queue: the owner (the registry) keeps every mailbox behind
//! its registry lock. What the mailbox does own is a `WaitSignal`, a
//! mutex/condvar pair used only to block a receiver that found nothing.
//!
//! # Wait protocol
//!
//! ```text
//! receiver                               sender
//! --------                               ------
//! lock registry
//! scan queue: no match
//! lock signal
//! unlock registry  ───────────────────►  lock registry
//! wait on signal (releases signal)       push message
//!                                        unlock registry
//!                  ◄───────────────────  lock signal, notify
//! unlock signal
//! lock registry, rescan from head
//! ```
//!
//! The receiver takes the signal lock before giving up the registry lock,
//! and a sender notifies while holding the signal lock, so a notify can
//! never fall between "scan found nothing" and "start waiting".

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Lock + condition pair a blocked receiver sleeps on
#[derive(Debug, Default)]
pub struct WaitSignal {
    lock: Mutex<()>,
    cond: Condvar,
}

impl WaitSignal {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release `outer` and block until notified
    ///
    /// `outer` is the guard of the lock protecting the queue. The signal
    /// lock is acquired before `outer` is dropped, which makes "release
    /// the queue, start waiting" atomic with respect to `notify`.
    /// Returns with no lock held; the caller re-locks and rescans.
    /// Spurious wakeups are possible, so callers must loop.
    pub fn release_and_wait<G>(&self, outer: G) {
        let guard = self.lock();
        drop(outer);
        let guard = self.cond.wait(guard).unwrap_or_else(PoisonError::into_inner);
        drop(guard);
    }

    /// Wake the receiver blocked on this signal, if any
    pub fn notify(&self) {
        let _guard = self.lock();
        self.cond.notify_one();
    }
}

/// FIFO of owned messages with first-match removal
#[derive(Debug)]
pub struct Mailbox<T> {
    queue: VecDeque<T>,
    signal: Arc<WaitSignal>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            signal: Arc::new(WaitSignal::new()),
        }
    }

    /// Append a message at the tail; ownership moves into the mailbox
    #[inline]
    pub fn push(&mut self, message: T) {
        self.queue.push_back(message);
    }

    /// Remove and return the first message accepted by `matcher`
    ///
    /// Messages before and after the match keep their relative order.
    pub fn take_first<F>(&mut self, mut matcher: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
    {
        let pos = self.queue.iter().position(|m| matcher(m))?;
        self.queue.remove(pos)
    }

    /// Like `take_first`, but the matcher also yields a value derived from
    /// the matching message (for instance the unified term)
    pub fn take_first_map<F, R>(&mut self, mut matcher: F) -> Option<(T, R)>
    where
        F: FnMut(&T) -> Option<R>,
    {
        let (pos, derived) = self
            .queue
            .iter()
            .enumerate()
            .find_map(|(i, m)| matcher(m).map(|r| (i, r)))?;
        self.queue.remove(pos).map(|m| (m, derived))
    }

    /// Return the first message accepted by `matcher` without removing it
    pub fn find<F>(&self, mut matcher: F) -> Option<&T>
    where
        F: FnMut(&T) -> bool,
    {
        self.queue.iter().find(|m| matcher(m))
    }

    /// Non-removing variant of `take_first_map`
    pub fn find_map<F, R>(&self, matcher: F) -> Option<R>
    where
        F: FnMut(&T) -> Option<R>,
    {
        self.queue.iter().find_map(matcher)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Handle on the wait signal; cloned so it outlives the queue lock
    #[inline]
    pub fn signal(&self) -> &Arc<WaitSignal> {
        &self.signal
    }

    /// Consume the mailbox, returning every undelivered message in order
    pub fn drain(self) -> Vec<T> {
        self.queue.into_iter().collect()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
