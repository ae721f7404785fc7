//! Transient id-keyed retention of selected task outputs
//!
//! The store is append-only by key: `set` never overwrites, and reads return
//! the first entry with a matching id. Its lifetime is bounded to one
//! sequencer cycle; the engine clears it on every reset.

use serde_json::Value;

/// One retained task output.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub task_id: u64,
    pub data: Value,
}

/// Ordered store of cached task outputs, queried by exact task id.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: Vec<CacheEntry>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry unconditionally. Duplicate ids are permitted;
    /// `get` resolves them first-match-wins.
    pub fn set(&mut self, task_id: u64, data: Value) {
        self.entries.push(CacheEntry { task_id, data });
    }

    /// Look up the first entry with a matching task id.
    pub fn get(&self, task_id: u64) -> Option<&Value> {
        self.entries
            .iter()
            .find(|entry| entry.task_id == task_id)
            .map(|entry| &entry.data)
    }

    /// Drop all entries. Called on every sequencer reset.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
