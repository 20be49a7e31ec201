//! Unix signal delivery through pthread_kill

use enthread_core::error::{ThreadError, ThreadResult};
use nix::errno::Errno;
use nix::sys::pthread::{pthread_kill, pthread_self, Pthread};
pub use nix::sys::signal::Signal;
use std::os::unix::thread::JoinHandleExt;
use std::str::FromStr;
use std::thread::JoinHandle;

/// Native handle used to address a thread with a signal
pub type NativeThread = Pthread;

/// Native handle of the calling thread
#[inline]
pub fn current_native() -> NativeThread {
    pthread_self()
}

/// Native handle of a spawned thread
#[inline]
pub fn native_of<T>(handle: &JoinHandle<T>) -> NativeThread {
    handle.as_pthread_t()
}

/// Deliver `signal` to `thread`; `None` only checks the thread exists
///
/// `ESRCH` means the thread has already terminated and maps to
/// `NotFound`. Any other errno means the handle or signal was invalid,
/// which callers cannot recover from.
pub fn deliver(thread: NativeThread, signal: Option<Signal>) -> ThreadResult<()> {
    match pthread_kill(thread, signal) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(ThreadError::not_found("(terminated)")),
        Err(e) => Err(ThreadError::Fatal(format!("pthread_kill: {}", e))),
    }
}

/// Parse a signal given as `SIGUSR1`, `usr1` or a number
pub fn parse_signal(name: &str) -> ThreadResult<Signal> {
    let name = name.trim();
    let parsed = if let Ok(num) = name.parse::<i32>() {
        Signal::try_from(num).ok()
    } else {
        let upper = name.to_ascii_uppercase();
        if upper.starts_with("SIG") {
            Signal::from_str(&upper).ok()
        } else {
            Signal::from_str(&format!("SIG{}", upper)).ok()
        }
    };
    parsed.ok_or_else(|| ThreadError::InvalidOption(format!("unknown signal `{}`", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signal_forms() {
        assert_eq!(parse_signal("SIGUSR1").unwrap(), Signal::SIGUSR1);
        assert_eq!(parse_signal("usr2").unwrap(), Signal::SIGUSR2);
        assert_eq!(parse_signal("sigurg").unwrap(), Signal::SIGURG);
        assert_eq!(parse_signal("2").unwrap(), Signal::SIGINT);
    }

    #[test]
    fn test_parse_signal_rejects_unknown() {
        assert!(matches!(parse_signal("SIGNOPE"), Err(ThreadError::InvalidOption(_))));
        assert!(parse_signal("9999").is_err());
    }

    #[test]
    fn test_deliver_existence_check() {
        assert!(deliver(current_native(), None).is_ok());
    }

    #[test]
    fn test_deliver_ignored_signal_to_live_thread() {
        // SIGURG is ignored by default
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let handle = std::thread::spawn(move || {
            let _ = rx.recv();
        });
        assert!(deliver(native_of(&handle), Some(Signal::SIGURG)).is_ok());
        tx.send(()).unwrap();
        handle.join().unwrap();
    }
}
