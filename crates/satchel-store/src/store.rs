//! # Cart Store
//!
//! Holds the one live [`CartSnapshot`] of a cart engine.
//!
//! ## Replacement Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  update(f)                                                             │
//! │     │                                                                   │
//! │     ├── write lock                                                      │
//! │     │     next = f(&current)      ← pure, from satchel-core             │
//! │     │     Err      ─► rejected, nothing changes                         │
//! │     │     next == current ─► unchanged, nothing changes                 │
//! │     │     current = Arc::new(next); revision += 1                       │
//! │     ├── unlock                                                          │
//! │     │                                                                   │
//! │     └── notify_all  (exactly once, lock released)                       │
//! │                                                                         │
//! │  current() ── read lock ── Arc::clone ──► never a half-built snapshot   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshots are never edited in place. Readers hold an `Arc` to the value
//! they read, which stays valid however many replacements follow.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use satchel_core::{CartSnapshot, CoreResult};

use crate::broadcaster::{Broadcaster, Subscription};

#[derive(Debug)]
struct StoreState {
    snapshot: Arc<CartSnapshot>,
    revision: u64,
}

#[derive(Debug)]
pub struct CartStore {
    state: RwLock<StoreState>,
    broadcaster: Broadcaster,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// An empty cart at revision 0.
    pub fn new() -> Self {
        CartStore {
            state: RwLock::new(StoreState {
                snapshot: Arc::new(CartSnapshot::empty()),
                revision: 0,
            }),
            broadcaster: Broadcaster::new(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The live snapshot.
    pub fn current(&self) -> Arc<CartSnapshot> {
        Arc::clone(&self.read().snapshot)
    }

    /// Number of replacements so far. 0 means the cart was never touched.
    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    /// Replaces the snapshot unconditionally and notifies.
    pub fn replace(&self, next: CartSnapshot) -> Arc<CartSnapshot> {
        let next = Arc::new(next);
        {
            let mut state = self.write();
            state.snapshot = Arc::clone(&next);
            state.revision += 1;
        }
        self.notify();
        next
    }

    /// Computes the next snapshot from the live one and swaps it in.
    ///
    /// Read, compute and swap happen under one write lock, so two commands
    /// from different threads can't lose each other's update.
    ///
    /// ## Returns
    /// * `Ok(Some(next))` - replaced and notified
    /// * `Ok(None)` - `f` returned an equal snapshot; nothing happened
    /// * `Err(e)` - `f` rejected the command; nothing happened
    pub fn update<F>(&self, f: F) -> CoreResult<Option<Arc<CartSnapshot>>>
    where
        F: FnOnce(&CartSnapshot) -> CoreResult<CartSnapshot>,
    {
        let next = {
            let mut state = self.write();
            let next = f(&state.snapshot)?;
            if next == *state.snapshot {
                return Ok(None);
            }
            let next = Arc::new(next);
            state.snapshot = Arc::clone(&next);
            state.revision += 1;
            next
        };

        self.notify();
        Ok(Some(next))
    }

    /// Installs `snapshot` only if the store was never replaced.
    ///
    /// Returns whether it was installed.
    pub fn seed(&self, snapshot: CartSnapshot) -> bool {
        {
            let mut state = self.write();
            if state.revision > 0 {
                return false;
            }
            state.snapshot = Arc::new(snapshot);
            state.revision = 1;
        }
        self.notify();
        true
    }

    /// Registers a change listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartSnapshot) + Send + Sync + 'static,
    {
        self.broadcaster.subscribe(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.broadcaster.listener_count()
    }

    fn notify(&self) {
        self.broadcaster.notify_all(|| self.current());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
