//! Thread status state machine
//!
//! A thread starts `Running` and moves exactly once to one of the four
//! terminal states. The transition is made by the thread itself right
//! before its OS thread ends; nothing moves a status back.

use core::fmt;

/// Status of an engine thread, carrying the terminal payload if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadStatus<P> {
    /// Goal still executing
    Running,

    /// Goal completed with success
    Succeeded,

    /// Goal completed with failure
    Failed,

    /// Goal raised an uncaught exception; carries the exception
    Exception(P),

    /// Thread called `exit`; carries the exit payload
    Exited(P),
}

/// Payload-free discriminant of a `ThreadStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusKind {
    Running = 0,
    Succeeded = 1,
    Failed = 2,
    Exception = 3,
    Exited = 4,
}

impl<P> ThreadStatus<P> {
    #[inline]
    pub fn kind(&self) -> StatusKind {
        match self {
            ThreadStatus::Running => StatusKind::Running,
            ThreadStatus::Succeeded => StatusKind::Succeeded,
            ThreadStatus::Failed => StatusKind::Failed,
            ThreadStatus::Exception(_) => StatusKind::Exception,
            ThreadStatus::Exited(_) => StatusKind::Exited,
        }
    }

    /// Check if this status is one of the four outcomes
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ThreadStatus::Running)
    }

    /// Borrow the terminal payload, if this status carries one
    pub fn payload(&self) -> Option<&P> {
        match self {
            ThreadStatus::Exception(p) | ThreadStatus::Exited(p) => Some(p),
            _ => None,
        }
    }

    /// Consume the status, returning the payload if any
    pub fn into_payload(self) -> Option<P> {
        match self {
            ThreadStatus::Exception(p) | ThreadStatus::Exited(p) => Some(p),
            _ => None,
        }
    }

    /// Convert the payload while keeping the state
    pub fn map<Q, F>(self, f: F) -> ThreadStatus<Q>
    where
        F: FnOnce(P) -> Q,
    {
        match self {
            ThreadStatus::Running => ThreadStatus::Running,
            ThreadStatus::Succeeded => ThreadStatus::Succeeded,
            ThreadStatus::Failed => ThreadStatus::Failed,
            ThreadStatus::Exception(p) => ThreadStatus::Exception(f(p)),
            ThreadStatus::Exited(p) => ThreadStatus::Exited(f(p)),
        }
    }

    pub fn as_ref(&self) -> ThreadStatus<&P> {
        match self {
            ThreadStatus::Running => ThreadStatus::Running,
            ThreadStatus::Succeeded => ThreadStatus::Succeeded,
            ThreadStatus::Failed => ThreadStatus::Failed,
            ThreadStatus::Exception(p) => ThreadStatus::Exception(p),
            ThreadStatus::Exited(p) => ThreadStatus::Exited(p),
        }
    }
}

impl<P> Default for ThreadStatus<P> {
    fn default() -> Self {
        ThreadStatus::Running
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Running => write!(f, "running"),
            StatusKind::Succeeded => write!(f, "true"),
            StatusKind::Failed => write!(f, "false"),
            StatusKind::Exception => write!(f, "exception"),
            StatusKind::Exited => write!(f, "exited"),
        }
    }
}

impl<P: fmt::Display> fmt::Display for ThreadStatus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadStatus::Exception(p) => write!(f, "exception({})", p),
            ThreadStatus::Exited(p) => write!(f, "exited({})", p),
            other => write!(f, "{}", other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!ThreadStatus::<i32>::Running.is_terminal());
        assert!(ThreadStatus::<i32>::Succeeded.is_terminal());
        assert!(ThreadStatus::<i32>::Failed.is_terminal());
        assert!(ThreadStatus::Exception(1).is_terminal());
        assert!(ThreadStatus::Exited(1).is_terminal());
    }

    #[test]
    fn test_payload_only_on_payload_states() {
        assert_eq!(ThreadStatus::<i32>::Succeeded.payload(), None);
        assert_eq!(ThreadStatus::Exited(5).payload(), Some(&5));
        assert_eq!(ThreadStatus::Exception(6).into_payload(), Some(6));
        assert_eq!(ThreadStatus::<i32>::Failed.into_payload(), None);
    }

    #[test]
    fn test_map_keeps_state() {
        let s = ThreadStatus::Exited(21).map(|v| v * 2);
        assert_eq!(s, ThreadStatus::Exited(42));
        assert_eq!(s.kind(), StatusKind::Exited);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ThreadStatus::<i32>::Running), "running");
        assert_eq!(format!("{}", ThreadStatus::<i32>::Succeeded), "true");
        assert_eq!(format!("{}", ThreadStatus::Exited("bye")), "exited(bye)");
    }
}
