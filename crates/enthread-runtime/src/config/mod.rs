//! Thread runtime configuration
//!
//! Provides compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables (runtime)
//! 3. Library defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use enthread_runtime::config::ThreadConfig;
//!
//! let config = ThreadConfig::from_env().max_threads(16);
//! ```

pub mod defaults;

use enthread_core::error::{ThreadError, ThreadResult};
use enthread_core::options::{kb_to_bytes, StackSizes, KB};
use log::warn;
use std::str::FromStr;

/// Parse `key` from the environment, falling back to `default` when the
/// variable is unset or does not parse
fn env_get<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a size in KB from `key` as bytes
///
/// A value whose byte count overflows is ignored with a warning, like a
/// value that does not parse.
fn env_kb(key: &str, default_kb: usize) -> usize {
    let kb = env_get(key, default_kb);
    kb_to_bytes(kb).unwrap_or_else(|| {
        warn!("{}={} overflows, using {} KB", key, kb, default_kb);
        default_kb.saturating_mul(KB)
    })
}

/// Process-wide thread configuration with builder pattern.
#[derive(Debug, Clone)]
pub struct ThreadConfig {
    /// Number of registry slots, including slot 0 of the initial thread
    pub max_threads: usize,
    /// Engine stack sizes used when a creation option leaves one unset
    pub default_stacks: StackSizes,
    /// Native stack size of spawned OS threads, in bytes
    pub os_stack_size: usize,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ThreadConfig {
    /// Create config from library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `ENT_MAX_THREADS` - Registry capacity
    /// - `ENT_LOCAL_STACK_KB` - Default local stack
    /// - `ENT_GLOBAL_STACK_KB` - Default global stack
    /// - `ENT_TRAIL_STACK_KB` - Default trail stack
    /// - `ENT_ARGUMENT_STACK_KB` - Default argument stack
    /// - `ENT_OS_STACK_KB` - Native stack of spawned threads
    pub fn from_env() -> Self {
        Self {
            max_threads: env_get("ENT_MAX_THREADS", defaults::MAX_THREADS),
            default_stacks: StackSizes {
                local: env_kb("ENT_LOCAL_STACK_KB", defaults::LOCAL_STACK_KB),
                global: env_kb("ENT_GLOBAL_STACK_KB", defaults::GLOBAL_STACK_KB),
                trail: env_kb("ENT_TRAIL_STACK_KB", defaults::TRAIL_STACK_KB),
                argument: env_kb("ENT_ARGUMENT_STACK_KB", defaults::ARGUMENT_STACK_KB),
            },
            os_stack_size: env_kb("ENT_OS_STACK_KB", defaults::OS_STACK_KB),
        }
    }

    /// Create config with library defaults only (no env override).
    pub fn new() -> Self {
        Self {
            max_threads: defaults::MAX_THREADS,
            default_stacks: StackSizes::from_kb(
                defaults::LOCAL_STACK_KB,
                defaults::GLOBAL_STACK_KB,
                defaults::TRAIL_STACK_KB,
                defaults::ARGUMENT_STACK_KB,
            ),
            os_stack_size: defaults::OS_STACK_KB * KB,
        }
    }

    // Builder methods

    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = n;
        self
    }

    pub fn default_stacks(mut self, stacks: StackSizes) -> Self {
        self.default_stacks = stacks;
        self
    }

    pub fn os_stack_size(mut self, bytes: usize) -> Self {
        self.os_stack_size = bytes;
        self
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> ThreadResult<()> {
        if self.max_threads < 2 {
            return Err(ThreadError::InvalidOption(
                "max_threads must be >= 2 (slot 0 is the initial thread)".into(),
            ));
        }
        if self.max_threads > u32::MAX as usize {
            return Err(ThreadError::InvalidOption("max_threads does not fit a thread id".into()));
        }
        if self.os_stack_size == 0 {
            return Err(ThreadError::InvalidOption("os_stack_size must be > 0".into()));
        }
        self.default_stacks.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ThreadConfig::new();
        assert_eq!(config.max_threads, defaults::MAX_THREADS);
        assert_eq!(config.default_stacks.local, defaults::LOCAL_STACK_KB * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ThreadConfig::new()
            .max_threads(8)
            .default_stacks(StackSizes::from_kb(1, 2, 3, 4))
            .os_stack_size(256 * 1024);

        assert_eq!(config.max_threads, 8);
        assert_eq!(config.default_stacks.argument, 4 * 1024);
        assert_eq!(config.os_stack_size, 256 * 1024);
    }

    #[test]
    fn test_validation() {
        assert!(ThreadConfig::new().max_threads(1).validate().is_err());
        assert!(ThreadConfig::new().os_stack_size(0).validate().is_err());
        assert!(ThreadConfig::new()
            .default_stacks(StackSizes::from_kb(0, 1, 1, 1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("__ENT_TEST_MAX__", "12");
        assert_eq!(env_get("__ENT_TEST_MAX__", 3usize), 12);
        std::env::set_var("__ENT_TEST_MAX__", "twelve");
        assert_eq!(env_get("__ENT_TEST_MAX__", 3usize), 3);
        std::env::remove_var("__ENT_TEST_MAX__");
    }

    #[test]
    fn test_env_kb_overflow_falls_back() {
        std::env::set_var("__ENT_TEST_KB__", "8");
        assert_eq!(env_kb("__ENT_TEST_KB__", 2), 8 * 1024);
        std::env::set_var("__ENT_TEST_KB__", usize::MAX.to_string());
        assert_eq!(env_kb("__ENT_TEST_KB__", 2), 2 * 1024);
        std::env::remove_var("__ENT_TEST_KB__");
    }

    #[test]
    fn test_from_env_huge_stack_does_not_panic() {
        std::env::set_var("ENT_OS_STACK_KB", usize::MAX.to_string());
        let config = ThreadConfig::from_env();
        std::env::remove_var("ENT_OS_STACK_KB");

        assert_eq!(config.os_stack_size, defaults::OS_STACK_KB * 1024);
        assert!(config.validate().is_ok());
    }
}
