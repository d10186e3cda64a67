//! Shared, serialized access to a [`Ledger`]
//!
//! The ledger's read-modify-write of the whole index is only safe while
//! invocations against the index key are serialized. When no host runtime
//! provides that ordering (embedding, tests), [`LedgerHandle`] does: every
//! invocation holds an async mutex for its full duration.

use crate::ledger::Ledger;
use crate::store::KeyValueStore;
use crate::types::{AllVotings, Timestamp};
use crate::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle serializing invocations onto one ledger
pub struct LedgerHandle<S: KeyValueStore> {
    inner: Arc<Mutex<Ledger<S>>>,
}

impl<S: KeyValueStore> Clone for LedgerHandle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> LedgerHandle<S> {
    pub fn new(ledger: Ledger<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Run a named invocation at wall-clock time
    pub async fn invoke(&self, function: &str, args: &[String]) -> Result<Option<Vec<u8>>> {
        self.inner.lock().await.invoke(function, args)
    }

    /// Run a named invocation at an explicit time
    pub async fn invoke_at(
        &self,
        function: &str,
        args: &[String],
        now: Timestamp,
    ) -> Result<Option<Vec<u8>>> {
        self.inner.lock().await.invoke_at(function, args, now)
    }

    /// Decode the stored index without sweeping
    pub async fn index(&self) -> Result<AllVotings> {
        self.inner.lock().await.index()
    }
}
