//! Error types for thread management

use thiserror::Error;

/// Result type for thread operations
pub type ThreadResult<T> = Result<T, ThreadError>;

/// Errors that can occur in thread, alias and mailbox operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadError {
    /// Every registry slot is in use
    #[error("no free thread slots (capacity {capacity})")]
    ResourceExhausted { capacity: usize },

    /// Id or alias does not name a live thread
    #[error("thread {0} does not exist")]
    NotFound(String),

    /// Alias already names another live thread
    #[error("alias `{0}` is already bound")]
    AlreadyBound(String),

    /// Malformed creation option, size or signal
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Operation not allowed for the calling thread
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// Thread spawn, join or signal syscall failed
    #[error("OS failure: {0}")]
    OsFailure(String),

    /// Invariant violation; never retried
    #[error("fatal: {0}")]
    Fatal(String),
}

impl ThreadError {
    /// Shorthand for a `NotFound` naming the given thread
    pub fn not_found(what: impl core::fmt::Display) -> Self {
        ThreadError::NotFound(what.to_string())
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ThreadError::NotFound(_))
    }
}

impl From<std::io::Error> for ThreadError {
    fn from(e: std::io::Error) -> Self {
        ThreadError::OsFailure(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = ThreadError::ResourceExhausted { capacity: 8 };
        assert_eq!(format!("{}", e), "no free thread slots (capacity 8)");

        let e = ThreadError::not_found("worker");
        assert_eq!(format!("{}", e), "thread worker does not exist");
        assert!(e.is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "EAGAIN");
        let e: ThreadError = io.into();
        assert!(matches!(e, ThreadError::OsFailure(ref msg) if msg.contains("EAGAIN")));
    }
}
