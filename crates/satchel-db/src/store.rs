//! # Key-Value Store Contract
//!
//! The only storage surface the cart engine talks to.
//!
//! ```text
//! ┌──────────────────────────┐
//! │   trait KeyValueStore    │  get(key) -> Option<String>
//! │                          │  set(key, value)
//! │                          │  delete(key)
//! └────────────┬─────────────┘
//!              │ implemented by
//!      ┌───────┴────────┐
//!      ▼                ▼
//!  Database         MemoryStore
//!  (SQLite)         (HashMap, clones share state)
//! ```
//!
//! Both operations are async. Callers treat every error as "storage is
//! unavailable right now"; the in-memory cart never depends on the result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{DbError, DbResult};
use crate::pool::Database;

/// Asynchronous string key-value store.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Reads the value under `key`, `None` if absent.
    fn get(&self, key: &str) -> impl Future<Output = DbResult<Option<String>>> + Send;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = DbResult<()>> + Send;

    /// Removes `key`. Missing keys are not an error.
    fn delete(&self, key: &str) -> impl Future<Output = DbResult<()>> + Send;
}

impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        self.kv().get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        self.kv().set(key, value).await
    }

    async fn delete(&self, key: &str) -> DbResult<()> {
        self.kv().delete(key).await
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Process-local store.
///
/// Clones share the same entries, which is how tests simulate a restart:
/// drop the whole cart stack, keep a clone of the store, build a new stack
/// on top of it. Reads and writes can be made to fail on demand.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: RwLock<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `get` fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `set`/`delete` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> DbResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable(format!("{op} disabled")));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        self.check(&self.inner.fail_reads, "read")?;
        Ok(self.inner.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        self.check(&self.inner.fail_writes, "write")?;
        self.inner
            .entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> DbResult<()> {
        self.check(&self.inner.fail_writes, "write")?;
        self.inner.entries.write().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
