//! Asynchronous signal delivery to engine threads
//!
//! Uses `pthread_kill` on Unix systems.

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub use unix::*;
    } else {
        compile_error!("Unsupported platform: thread signals need pthreads");
    }
}
