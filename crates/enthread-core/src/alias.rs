//! Alias table: unique names bound to live thread ids
//!
//! The table has no lock of its own; it lives next to the slot table and
//! is guarded by the same registry lock.

use std::collections::HashMap;
use crate::id::ThreadId;

/// Name -> id map, created on first bind
#[derive(Debug, Default)]
pub struct AliasTable {
    map: Option<HashMap<String, ThreadId>>,
}

impl AliasTable {
    pub const fn new() -> Self {
        Self { map: None }
    }

    /// Bind `name` to `id`
    ///
    /// Returns `false` (and records nothing) if `name` already names a
    /// different thread. Binding a name to the id it already names is
    /// accepted.
    pub fn bind(&mut self, id: ThreadId, name: &str) -> bool {
        let map = self.map.get_or_insert_with(|| HashMap::with_capacity(16));
        match map.get(name) {
            Some(&bound) => bound == id,
            None => {
                map.insert(name.to_string(), id);
                true
            }
        }
    }

    /// Remove the binding for `name`; no-op if it is not bound
    pub fn unbind(&mut self, name: &str) -> Option<ThreadId> {
        self.map.as_mut().and_then(|m| m.remove(name))
    }

    /// Resolve a name to the id it is bound to
    #[inline]
    pub fn resolve(&self, name: &str) -> Option<ThreadId> {
        self.map.as_ref().and_then(|m| m.get(name).copied())
    }

    pub fn len(&self) -> usize {
        self.map.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
