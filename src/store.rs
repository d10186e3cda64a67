//! Store adapter over the host's atomic key-value store
//!
//! The host exposes only `get(key)` and `put(key, value)`. This module wraps
//! them with JSON encoding, the ledger's well-known keys and a write buffer
//! so a failed operation leaves nothing behind:
//!
//! 1. [`KeyValueStore`] is the seam to the host
//! 2. [`Transaction`] buffers puts until [`Transaction::commit`]
//! 3. [`StateStore`] encodes and decodes records on top of either
//!
//! No retries and no caching happen here; every operation re-fetches what it
//! needs.

use crate::types::AllVotings;
use crate::{Result, store_error};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Key holding the serialized poll index
pub const INDEX_KEY: &str = "_votingindex";

/// Diagnostic counter written by `initialize`
pub const COUNTER_KEY: &str = "abc";

/// Scratch snapshot of the poll being created
pub const POLL_SNAPSHOT_KEY: &str = "_debug1";

/// Scratch snapshot of the option most recently built
pub const OPTION_SNAPSHOT_KEY: &str = "_debug2";

/// Synchronous get/put primitives provided by the host
///
/// Calls participate in the host's transaction; implementations must not
/// buffer or retry on their own.
pub trait KeyValueStore {
    /// Fetch the value under `key`, `None` when it was never written
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Store a non-authoritative value whose loss must not fail the caller
    fn put_best_effort(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.put(key, value)
    }
}

/// In-process store backed by a `HashMap`
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(store_error!("Key must not be empty"));
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Write buffer over a base store
///
/// Reads see the transaction's own writes first. Dropping the transaction
/// without calling [`commit`](Self::commit) discards every buffered put.
pub struct Transaction<'a> {
    base: &'a mut dyn KeyValueStore,
    writes: BTreeMap<String, Vec<u8>>,
    best_effort: BTreeSet<String>,
}

impl<'a> Transaction<'a> {
    pub fn begin(base: &'a mut dyn KeyValueStore) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
            best_effort: BTreeSet::new(),
        }
    }

    /// Number of keys written so far
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Flush buffered writes to the base store in key order
    ///
    /// Best-effort keys that fail are skipped. Any other failure stops the
    /// flush; keys already flushed stay written, so atomicity across keys
    /// still relies on the host's own transaction.
    pub fn commit(self) -> Result<usize> {
        let mut written = 0;
        for (key, value) in self.writes {
            if self.best_effort.contains(&key) {
                match self.base.put_best_effort(&key, value) {
                    Ok(()) => written += 1,
                    Err(e) => tracing::debug!(key = %key, error = %e, "Skipped best-effort write"),
                }
            } else {
                self.base.put(&key, value)?;
                written += 1;
            }
        }
        Ok(written)
    }
}

impl KeyValueStore for Transaction<'_> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.base.get(key),
        }
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(store_error!("Key must not be empty"));
        }
        self.best_effort.remove(key);
        self.writes.insert(key.to_string(), value);
        Ok(())
    }

    fn put_best_effort(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.put(key, value)?;
        self.best_effort.insert(key.to_string());
        Ok(())
    }
}

/// Typed record access on top of a [`KeyValueStore`]
pub struct StateStore<'a> {
    store: &'a mut dyn KeyValueStore,
    record_diagnostics: bool,
}

impl<'a> StateStore<'a> {
    pub fn new(store: &'a mut dyn KeyValueStore) -> Self {
        Self {
            store,
            record_diagnostics: true,
        }
    }

    /// Enable or disable the scratch snapshot writes
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.record_diagnostics = enabled;
        self
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store.get(key)
    }

    pub fn put_raw(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.store.put(key, value)
    }

    /// Decode the record under `key`
    ///
    /// An absent key or an undecodable value both yield `T::default()`.
    /// Store failures still propagate.
    pub fn load<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let Some(bytes) = self.store.get(key)? else {
            return Ok(T::default());
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::warn!(key, error = %e, "Undecodable record, using an empty default");
                Ok(T::default())
            }
        }
    }

    /// Encode `record` and store it under `key`
    pub fn save<T: Serialize>(&mut self, key: &str, record: &T) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        self.store.put(key, bytes)
    }

    pub fn load_index(&self) -> Result<AllVotings> {
        self.load(INDEX_KEY)
    }

    pub fn save_index(&mut self, index: &AllVotings) -> Result<()> {
        self.save(INDEX_KEY, index)
    }

    /// Best-effort scratch write; failures are logged and swallowed
    pub fn put_diagnostic<T: Serialize>(&mut self, key: &str, record: &T) {
        if !self.record_diagnostics {
            return;
        }
        let written = serde_json::to_vec(record)
            .map_err(crate::Error::from)
            .and_then(|bytes| self.store.put_best_effort(key, bytes));
        if let Err(e) = written {
            tracing::debug!(key, error = %e, "Diagnostic write failed");
        }
    }
}
