//! Resumable enumeration cursor over registry slots
//!
//! The cursor is the whole state of an enumeration: the host keeps it
//! between resumptions and hands it back for the next step. Each step
//! takes the registry lock on its own, so the sequence is not a snapshot:
//! a thread created or joined between two steps may or may not be seen,
//! depending on whether its slot is above or below the cursor.

use crate::id::ThreadRef;

/// First slot index a scan visits; slot 0 (the initial thread) is only
/// reachable by direct lookup
pub const FIRST_SCAN_INDEX: usize = 1;

/// Position of an enumeration, plus an optional direct-lookup filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCursor {
    filter: Option<ThreadRef>,
    next: usize,
    done: bool,
}

impl EnumCursor {
    /// Cursor over every live slot
    pub fn all() -> Self {
        Self {
            filter: None,
            next: FIRST_SCAN_INDEX,
            done: false,
        }
    }

    /// Cursor yielding at most the one thread named by `target`
    pub fn lookup(target: impl Into<ThreadRef>) -> Self {
        Self {
            filter: Some(target.into()),
            next: FIRST_SCAN_INDEX,
            done: false,
        }
    }

    pub fn new(filter: Option<ThreadRef>) -> Self {
        match filter {
            Some(target) => Self::lookup(target),
            None => Self::all(),
        }
    }

    #[inline]
    pub fn filter(&self) -> Option<&ThreadRef> {
        self.filter.as_ref()
    }

    /// Index the next scan step starts at
    #[inline]
    pub fn position(&self) -> usize {
        self.next
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Consume the single step of a lookup cursor
    ///
    /// Returns the filter the first time, `None` afterwards.
    pub fn take_lookup(&mut self) -> Option<&ThreadRef> {
        if self.done {
            return None;
        }
        self.done = true;
        self.filter.as_ref()
    }

    /// Advance a scan cursor
    ///
    /// Calls `probe` on each index from the current position up to
    /// `capacity`, skipping indexes for which it returns `None`. On a hit
    /// the cursor resumes at the following index next time. Once the end
    /// is reached the cursor stays done.
    pub fn advance<T, F>(&mut self, capacity: usize, mut probe: F) -> Option<T>
    where
        F: FnMut(usize) -> Option<T>,
    {
        if self.done {
            return None;
        }
        while self.next < capacity {
            let index = self.next;
            self.next += 1;
            if let Some(item) = probe(index) {
                return Some(item);
            }
        }
        self.done = true;
        None
    }
}

impl Default for EnumCursor {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_skips_free_and_resumes() {
        let live = [false, true, false, true, true, false];
        let mut cursor = EnumCursor::all();

        let mut seen = vec![];
        while let Some(i) = cursor.advance(live.len(), |i| live[i].then_some(i)) {
            seen.push(i);
        }

        assert_eq!(seen, vec![1, 3, 4]);
        assert!(cursor.is_done());
        assert_eq!(cursor.advance(live.len(), |i| Some(i)), None);
    }

    #[test]
    fn test_scan_sees_later_slots_created_between_steps() {
        let mut live = vec![false, true, false, false];
        let mut cursor = EnumCursor::all();

        assert_eq!(cursor.advance(live.len(), |i| live[i].then_some(i)), Some(1));
        live[3] = true;
        assert_eq!(cursor.advance(live.len(), |i| live[i].then_some(i)), Some(3));
        assert_eq!(cursor.advance(live.len(), |i| live[i].then_some(i)), None);
    }

    #[test]
    fn test_lookup_single_step() {
        let mut cursor = EnumCursor::lookup("worker");
        assert_eq!(cursor.take_lookup(), Some(&ThreadRef::Alias("worker".into())));
        assert_eq!(cursor.take_lookup(), None);
        assert!(cursor.is_done());
    }

    #[test]
    fn test_new_dispatches_on_filter() {
        assert_eq!(EnumCursor::new(None), EnumCursor::all());
        assert!(EnumCursor::new(Some(ThreadRef::from(2u32))).filter().is_some());
    }
}
