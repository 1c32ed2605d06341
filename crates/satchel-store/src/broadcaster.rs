//! # Broadcaster
//!
//! Registry of cart listeners.
//!
//! ## Notification Round
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  notify_all(current)                                                   │
//! │     │                                                                   │
//! │     ├── lock ─► copy (id, listener) pairs ─► unlock                     │
//! │     │                                                                   │
//! │     └── for each pair:                                                  │
//! │            still subscribed?  ── no ──► skip                            │
//! │                 │ yes                                                   │
//! │                 ▼                                                       │
//! │            listener(&current())     ← lock NOT held                     │
//! │                                       (may subscribe, unsubscribe, or   │
//! │                                        issue another cart command)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each listener reads the snapshot when its turn comes, so a listener that
//! runs after a nested command sees the result of that command too. Every
//! listener ends a round on the same, final snapshot.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use satchel_core::CartSnapshot;

/// A cart change listener.
pub type Listener = Arc<dyn Fn(&CartSnapshot) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Listener>>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, Listener>> {
        // Entries are inserted or removed whole; a panic elsewhere can't
        // leave the map half-updated.
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) -> bool {
        self.lock().remove(&id).is_some()
    }
}

#[derive(Default)]
pub struct Broadcaster {
    registry: Arc<Registry>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`. It stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartSnapshot) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.lock().insert(id, Arc::new(listener));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Calls every registered listener once with `current()`.
    pub fn notify_all(&self, current: impl Fn() -> Arc<CartSnapshot>) {
        let round: Vec<(u64, Listener)> = self
            .registry
            .lock()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        for (id, listener) in round {
            // Unsubscribed by an earlier listener of this round
            if !self.registry.lock().contains_key(&id) {
                continue;
            }
            listener(&current());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.lock().len()
    }
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Handle of one registered listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Removes the listener now. Safe to call from inside a listener.
    pub fn unsubscribe(self) {
        // Drop does the work
    }

    /// True while the listener is registered.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.lock().contains_key(&self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn snapshot() -> Arc<CartSnapshot> {
        Arc::new(CartSnapshot::empty())
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&CartSnapshot) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        (count, move |_: &CartSnapshot| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_each_listener_called_once_per_round() {
        let broadcaster = Broadcaster::new();
        let (a, la) = counter();
        let (b, lb) = counter();
        let _sa = broadcaster.subscribe(la);
        let _sb = broadcaster.subscribe(lb);

        broadcaster.notify_all(snapshot);
        broadcaster.notify_all(snapshot);

        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_and_unsubscribe_remove_listener() {
        let broadcaster = Broadcaster::new();
        let (a, la) = counter();
        let (b, lb) = counter();
        let sa = broadcaster.subscribe(la);
        let sb = broadcaster.subscribe(lb);
        assert_eq!(broadcaster.listener_count(), 2);
        assert!(sa.is_active());

        sa.unsubscribe();
        drop(sb);
        broadcaster.notify_all(snapshot);

        assert_eq!(broadcaster.listener_count(), 0);
        assert_eq!(a.load(Ordering::SeqCst) + b.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_can_unsubscribe_itself() {
        let broadcaster = Broadcaster::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));

        let sub = {
            let slot = Arc::clone(&slot);
            let calls = Arc::clone(&calls);
            broadcaster.subscribe(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(me) = slot.lock().unwrap().take() {
                    me.unsubscribe();
                }
            })
        };
        *slot.lock().unwrap() = Some(sub);

        broadcaster.notify_all(snapshot);
        broadcaster.notify_all(snapshot);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(broadcaster.listener_count(), 0);
    }

    #[test]
    fn test_listener_can_unsubscribe_a_later_one() {
        let broadcaster = Broadcaster::new();
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let _killer = {
            let victim = Arc::clone(&victim);
            broadcaster.subscribe(move |_| {
                victim.lock().unwrap().take();
            })
        };
        let (count, listener) = counter();
        *victim.lock().unwrap() = Some(broadcaster.subscribe(listener));

        broadcaster.notify_all(snapshot);

        // Removed before its turn in the same round
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_can_subscribe_during_round() {
        let broadcaster = Arc::new(Broadcaster::new());
        let added: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));

        let _adder = {
            let target = Arc::clone(&broadcaster);
            let added = Arc::clone(&added);
            broadcaster.subscribe(move |_| {
                let sub = target.subscribe(|_| {});
                added.lock().unwrap().push(sub);
            })
        };

        broadcaster.notify_all(snapshot);
        assert_eq!(broadcaster.listener_count(), 2);

        broadcaster.notify_all(snapshot);
        assert_eq!(broadcaster.listener_count(), 3);
    }

    #[test]
    fn test_subscription_outliving_broadcaster() {
        let broadcaster = Broadcaster::new();
        let sub = broadcaster.subscribe(|_| {});
        drop(broadcaster);

        assert!(!sub.is_active());
        drop(sub);
    }
}
