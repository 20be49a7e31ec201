//! Library defaults, overridable through the environment

/// Registry capacity, slot 0 included
pub const MAX_THREADS: usize = 100;

/// Engine stack sizes in KB
pub const LOCAL_STACK_KB: usize = 2048;
pub const GLOBAL_STACK_KB: usize = 4096;
pub const TRAIL_STACK_KB: usize = 4096;
pub const ARGUMENT_STACK_KB: usize = 1024;

/// Native stack of spawned OS threads in KB
pub const OS_STACK_KB: usize = 2048;
