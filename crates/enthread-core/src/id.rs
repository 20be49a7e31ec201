//! Thread identifier and thread references

use core::fmt;

/// Public identifier of an engine thread
///
/// This is the index of the thread's slot in the registry. Slot 0 belongs
/// to the initial thread; spawned threads always get ids in `1..capacity`.
/// The maximum value (u32::MAX) is reserved as a sentinel for "no engine
/// bound to this OS thread".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ThreadId(u32);

impl ThreadId {
    /// Sentinel returned by `self_id` on an OS thread without an engine
    pub const NONE: ThreadId = ThreadId(u32::MAX);

    /// Id of the initial thread
    pub const MAIN: ThreadId = ThreadId(0);

    #[inline]
    pub const fn new(id: u32) -> Self {
        ThreadId(id)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Get as usize for indexing into the slot table
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub const fn is_main(self) -> bool {
        self.0 == 0
    }

    /// Convert to Option, mapping the sentinel to `None`
    #[inline]
    pub const fn to_option(self) -> Option<ThreadId> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }
}

impl From<u32> for ThreadId {
    #[inline]
    fn from(id: u32) -> Self {
        ThreadId(id)
    }
}

impl From<ThreadId> for u32 {
    #[inline]
    fn from(id: ThreadId) -> Self {
        id.0
    }
}

impl fmt::Debug for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "ThreadId(NONE)")
        } else {
            write!(f, "ThreadId({})", self.0)
        }
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.pad("none")
        } else {
            fmt::Display::fmt(&self.0, f)
        }
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        ThreadId::NONE
    }
}

/// A way of naming a thread: its numeric id or a bound alias
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThreadRef {
    Id(ThreadId),
    Alias(String),
}

impl From<ThreadId> for ThreadRef {
    fn from(id: ThreadId) -> Self {
        ThreadRef::Id(id)
    }
}

impl From<u32> for ThreadRef {
    fn from(id: u32) -> Self {
        ThreadRef::Id(ThreadId::new(id))
    }
}

impl From<&str> for ThreadRef {
    fn from(name: &str) -> Self {
        ThreadRef::Alias(name.to_string())
    }
}

impl From<String> for ThreadRef {
    fn from(name: String) -> Self {
        ThreadRef::Alias(name)
    }
}

impl From<&ThreadRef> for ThreadRef {
    fn from(r: &ThreadRef) -> Self {
        r.clone()
    }
}

impl fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadRef::Id(id) => write!(f, "{}", id),
            ThreadRef::Alias(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_basics() {
        let id = ThreadId::new(7);
        assert_eq!(id.as_u32(), 7);
        assert_eq!(id.as_usize(), 7);
        assert!(!id.is_none());
        assert!(!id.is_main());
        assert!(ThreadId::MAIN.is_main());
    }

    #[test]
    fn test_thread_id_none() {
        assert!(ThreadId::NONE.is_none());
        assert_eq!(ThreadId::NONE.to_option(), None);
        assert_eq!(ThreadId::default(), ThreadId::NONE);
        assert_eq!(format!("{}", ThreadId::NONE), "none");
    }

    #[test]
    fn test_thread_ref_conversions() {
        assert_eq!(ThreadRef::from(3u32), ThreadRef::Id(ThreadId::new(3)));
        assert_eq!(ThreadRef::from("worker"), ThreadRef::Alias("worker".into()));
        assert_eq!(format!("{}", ThreadRef::from("worker")), "worker");
        assert_eq!(format!("{}", ThreadRef::from(ThreadId::new(9))), "9");
    }
}
