//! # Persistence Gateway
//!
//! Write-behind cache front for one cart engine's storage key.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Persistence Gateway                                 │
//! │                                                                         │
//! │  CartFacade                                                            │
//! │     │ save(snap₁) save(snap₂) save(snap₃)     (sync, never blocks)      │
//! │     ▼                                                                   │
//! │  ┌──────────────────────┐                                              │
//! │  │ watch<Option<Arc>>   │  holds only the LATEST snapshot              │
//! │  └──────────┬───────────┘                                              │
//! │             │ changed()                                                │
//! │             ▼                                                           │
//! │  ┌──────────────────────────────────────────┐                          │
//! │  │            Writer task                    │                          │
//! │  │                                          │   mpsc: Flush(ack)        │
//! │  │  first change ──► deadline = now + window │◄─ mpsc: Shutdown(ack)    │
//! │  │  deadline hit ──► encode(latest) ──► set  │                          │
//! │  │  flush/shutdown ─► write latest now       │                          │
//! │  └──────────────────────────────────────────┘                          │
//! │             │                                                           │
//! │             ▼                                                           │
//! │       KeyValueStore                                                    │
//! │                                                                         │
//! │  snap₁ and snap₂ are never written: snap₃ replaced them before the     │
//! │  window closed. One write per window, always the newest content.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Policy
//! Every storage or encoding error is logged and dropped. Nothing here can
//! fail, block, or reorder a cart command.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch, OnceCell};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use satchel_core::{CartKind, CartSnapshot};
use satchel_db::KeyValueStore;

use crate::config::PersistConfig;
use crate::envelope::PersistedCart;
use crate::error::PersistResult;

type Pending = Option<Arc<CartSnapshot>>;

/// Commands for the writer task.
#[derive(Debug)]
enum GatewayCommand {
    /// Write the pending snapshot now.
    Flush(oneshot::Sender<()>),
    /// Write the pending snapshot, then stop.
    Shutdown(oneshot::Sender<()>),
}

// =============================================================================
// Gateway
// =============================================================================

/// Loads and saves one cart engine's snapshot.
///
/// Must be started inside a Tokio runtime (it spawns its writer task).
pub struct PersistenceGateway<S: KeyValueStore> {
    shared: Arc<Shared<S>>,
    pending: watch::Sender<Pending>,
    cmd_tx: mpsc::Sender<GatewayCommand>,
    loaded: OnceCell<Option<CartSnapshot>>,
}

struct Shared<S> {
    store: S,
    key: String,
    kind: CartKind,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    /// Starts the gateway for `kind` and spawns its writer task.
    pub fn start(store: S, kind: CartKind, config: &PersistConfig) -> Self {
        let shared = Arc::new(Shared {
            store,
            key: config.storage_key(kind),
            kind,
        });

        let (pending, pending_rx) = watch::channel(None);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let writer = Writer {
            shared: Arc::clone(&shared),
            debounce: config.debounce(),
            pending_rx,
            cmd_rx,
            dirty: false,
        };
        tokio::spawn(writer.run());

        info!(
            key = %shared.key,
            debounce_ms = config.storage.debounce_ms,
            "Persistence gateway started"
        );

        PersistenceGateway {
            shared,
            pending,
            cmd_tx,
            loaded: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> CartKind {
        self.shared.kind
    }

    /// The storage key this gateway reads and writes.
    pub fn key(&self) -> &str {
        &self.shared.key
    }

    /// Reads the saved snapshot, once.
    ///
    /// The first call hits the store; every later or concurrent call gets
    /// the same result. Missing, unreadable, or corrupt data all come back
    /// as `None`.
    pub async fn load_once(&self) -> Option<CartSnapshot> {
        self.loaded
            .get_or_init(|| self.shared.load())
            .await
            .clone()
    }

    /// True once `load_once` has resolved.
    pub fn has_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Queues `snapshot` to be written. Replaces anything still pending.
    ///
    /// Never blocks and never fails. The value written is the one passed
    /// here, not whatever the cart holds when the writer wakes up.
    pub fn save(&self, snapshot: Arc<CartSnapshot>) {
        if self.pending.is_closed() {
            debug!(key = %self.shared.key, "Gateway stopped, save dropped");
            return;
        }
        self.pending.send_replace(Some(snapshot));
    }

    /// Writes the pending snapshot (if any) without waiting for the
    /// debounce window.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.cmd_tx.send(GatewayCommand::Flush(ack)).await.is_err() {
            debug!(key = %self.shared.key, "Gateway stopped, flush ignored");
            return;
        }
        let _ = done.await;
    }

    /// Flushes, then stops the writer task. Later saves are dropped.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.cmd_tx.send(GatewayCommand::Shutdown(ack)).await.is_err() {
            return;
        }
        let _ = done.await;
        info!(key = %self.shared.key, "Persistence gateway stopped");
    }
}

impl<S: KeyValueStore> Shared<S> {
    async fn load(&self) -> Option<CartSnapshot> {
        let json = match self.store.get(&self.key).await {
            Ok(Some(json)) => json,
            Ok(None) => {
                info!(key = %self.key, "No saved cart");
                return None;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read saved cart");
                return None;
            }
        };

        match PersistedCart::decode(&json, self.kind) {
            Ok(snapshot) => {
                info!(key = %self.key, lines = snapshot.len(), "Loaded saved cart");
                Some(snapshot)
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable saved cart");
                None
            }
        }
    }

    async fn write(&self, snapshot: &CartSnapshot) {
        match self.try_write(snapshot).await {
            Ok(()) => debug!(key = %self.key, lines = snapshot.len(), "Cart saved"),
            Err(e) => warn!(key = %self.key, error = %e, "Failed to save cart"),
        }
    }

    /// An empty cart removes the key instead of storing an empty document.
    async fn try_write(&self, snapshot: &CartSnapshot) -> PersistResult<()> {
        if snapshot.is_empty() {
            self.store.delete(&self.key).await?;
            return Ok(());
        }

        let json = PersistedCart::new(self.kind, snapshot).encode()?;
        self.store.set(&self.key, &json).await?;
        Ok(())
    }
}

// =============================================================================
// Writer Task
// =============================================================================

struct Writer<S> {
    shared: Arc<Shared<S>>,
    debounce: Duration,
    pending_rx: watch::Receiver<Pending>,
    cmd_rx: mpsc::Receiver<GatewayCommand>,
    /// A change was seen by `changed()` but not written yet.
    dirty: bool,
}

impl<S: KeyValueStore> Writer<S> {
    async fn run(mut self) {
        debug!(key = %self.shared.key, "Cart writer started");

        // Set by the first change after a write; the window doesn't slide,
        // so a steady stream of saves still gets written.
        let mut deadline: Option<Instant> = None;

        let ack = loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(GatewayCommand::Flush(ack)) => {
                        self.write_pending().await;
                        deadline = None;
                        let _ = ack.send(());
                    }
                    Some(GatewayCommand::Shutdown(ack)) => {
                        self.write_pending().await;
                        break Some(ack);
                    }
                    None => {
                        // Gateway dropped without shutdown
                        self.write_pending().await;
                        break None;
                    }
                },
                changed = self.pending_rx.changed(), if deadline.is_none() => {
                    if changed.is_err() {
                        self.write_pending().await;
                        break None;
                    }
                    self.dirty = true;
                    deadline = Some(Instant::now() + self.debounce);
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    self.write_pending().await;
                }
            }
        };

        // Close both channels before acknowledging, so a save issued after
        // `shutdown()` returns is already seen as dropped.
        drop(self.pending_rx);
        drop(self.cmd_rx);
        if let Some(ack) = ack {
            let _ = ack.send(());
        }

        debug!(key = %self.shared.key, "Cart writer stopped");
    }

    /// Writes the latest pending snapshot, if there is one nobody wrote yet.
    async fn write_pending(&mut self) {
        let latest = {
            let pending = self.pending_rx.borrow_and_update();
            if !pending.has_changed() && !self.dirty {
                return;
            }
            pending.clone()
        };
        self.dirty = false;

        if let Some(snapshot) = latest {
            self.shared.write(&snapshot).await;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_core::operations::add_line;
    use satchel_core::{LineModifiers, Money, ProductRef, Variant};
    use satchel_db::{Database, DbConfig, MemoryStore};

    fn config(debounce_ms: u64) -> PersistConfig {
        let mut config = PersistConfig::default();
        config.storage.debounce_ms = debounce_ms;
        config
    }

    fn cart(quantity: i64) -> Arc<CartSnapshot> {
        let p1 = ProductRef::new("P1", "Burger", Money::from_minor(25_000));
        let cart = add_line(&CartSnapshot::empty(), &p1, quantity, LineModifiers::none()).unwrap();
        let cart = add_line(
            &cart,
            &p1,
            1,
            LineModifiers::none().with_variant(Variant::new("V-L", "Large", Money::from_minor(10_000))),
        )
        .unwrap();
        Arc::new(cart)
    }

    #[tokio::test]
    async fn test_save_flush_then_reload_in_new_gateway() {
        let store = MemoryStore::new();
        let saved = cart(3);

        let gateway = PersistenceGateway::start(store.clone(), CartKind::Marketplace, &config(250));
        gateway.save(Arc::clone(&saved));
        gateway.flush().await;
        assert_eq!(store.write_count(), 1);
        drop(gateway);

        // "Restart": a fresh gateway over the same storage
        let restarted = PersistenceGateway::start(store, CartKind::Marketplace, &config(250));
        let loaded = restarted.load_once().await.unwrap();

        assert_eq!(loaded, *saved);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.items()[0].subtotal().minor(), 75_000);
        assert_eq!(loaded.items()[1].subtotal().minor(), 35_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saves_inside_window_collapse_to_latest() {
        let store = MemoryStore::new();
        let gateway = PersistenceGateway::start(store.clone(), CartKind::Marketplace, &config(250));

        gateway.save(cart(1));
        gateway.save(cart(2));
        let last = cart(3);
        gateway.save(Arc::clone(&last));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.write_count(), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.write_count(), 1);

        let json = store.get(gateway.key()).await.unwrap().unwrap();
        let on_disk = PersistedCart::decode(&json, CartKind::Marketplace).unwrap();
        assert_eq!(on_disk, *last);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_write_separately() {
        let store = MemoryStore::new();
        let gateway = PersistenceGateway::start(store.clone(), CartKind::Marketplace, &config(50));

        gateway.save(cart(1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        gateway.save(cart(2));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_flush_without_pending_writes_nothing() {
        let store = MemoryStore::new();
        let gateway = PersistenceGateway::start(store.clone(), CartKind::Marketplace, &config(250));

        gateway.flush().await;
        gateway.save(cart(1));
        gateway.flush().await;
        gateway.flush().await;

        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let store = MemoryStore::new();
        let gateway = PersistenceGateway::start(store.clone(), CartKind::Marketplace, &config(250));

        store.set_fail_writes(true);
        gateway.save(cart(1));
        gateway.flush().await;
        assert_eq!(store.write_count(), 0);

        store.set_fail_writes(false);
        gateway.save(cart(2));
        gateway.flush().await;
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_and_stops() {
        let store = MemoryStore::new();
        let gateway = PersistenceGateway::start(store.clone(), CartKind::FoodOrder, &config(10_000));

        gateway.save(cart(1));
        gateway.shutdown().await;
        assert_eq!(store.write_count(), 1);

        gateway.save(cart(2));
        gateway.flush().await;
        gateway.shutdown().await;
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_removes_key() {
        let store = MemoryStore::new();
        let gateway = PersistenceGateway::start(store.clone(), CartKind::Marketplace, &config(250));

        gateway.save(cart(1));
        gateway.flush().await;
        assert!(store.get(gateway.key()).await.unwrap().is_some());

        gateway.save(Arc::new(CartSnapshot::empty()));
        gateway.flush().await;
        assert!(store.get(gateway.key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_once_reads_store_once() {
        let store = MemoryStore::new();
        let writer = PersistenceGateway::start(store.clone(), CartKind::Marketplace, &config(250));
        writer.save(cart(2));
        writer.shutdown().await;

        let gateway = PersistenceGateway::start(store.clone(), CartKind::Marketplace, &config(250));
        assert!(!gateway.has_loaded());

        let (a, b) = tokio::join!(gateway.load_once(), gateway.load_once());
        assert!(a.is_some());
        assert_eq!(a, b);
        assert!(gateway.has_loaded());

        // Later storage changes are not re-read
        store.delete(gateway.key()).await.unwrap();
        assert_eq!(gateway.load_once().await, a);
    }

    #[tokio::test]
    async fn test_unreadable_data_loads_as_nothing() {
        let store = MemoryStore::new();
        let config = config(250);
        let key = config.storage_key(CartKind::Marketplace);

        store.set(&key, "{ definitely not a cart").await.unwrap();
        let gateway = PersistenceGateway::start(store.clone(), CartKind::Marketplace, &config);
        assert_eq!(gateway.load_once().await, None);

        let food = PersistedCart::new(CartKind::FoodOrder, &cart(1)).encode().unwrap();
        store.set(&key, &food).await.unwrap();
        let gateway = PersistenceGateway::start(store.clone(), CartKind::Marketplace, &config);
        assert_eq!(gateway.load_once().await, None);

        store.set_fail_reads(true);
        let gateway = PersistenceGateway::start(store, CartKind::Marketplace, &config);
        assert_eq!(gateway.load_once().await, None);
    }

    #[tokio::test]
    async fn test_cart_kinds_use_separate_keys() {
        let store = MemoryStore::new();
        let market = PersistenceGateway::start(store.clone(), CartKind::Marketplace, &config(250));
        let food = PersistenceGateway::start(store.clone(), CartKind::FoodOrder, &config(250));
        assert_ne!(market.key(), food.key());

        market.save(cart(1));
        market.flush().await;

        assert!(food.load_once().await.is_none());
    }

    #[tokio::test]
    async fn test_sqlite_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let saved = cart(4);

        let gateway = PersistenceGateway::start(db.clone(), CartKind::Marketplace, &config(250));
        gateway.save(Arc::clone(&saved));
        gateway.shutdown().await;

        let restarted = PersistenceGateway::start(db, CartKind::Marketplace, &config(250));
        assert_eq!(restarted.load_once().await.as_ref(), Some(&*saved));
    }
}
