//! # Cart Facade
//!
//! The API screens bind to. One facade per cart engine per session.
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Command Flow                                    │
//! │                                                                         │
//! │  Screen Action           Facade                Core op                  │
//! │  ─────────────           ──────                ───────                  │
//! │  Add to cart ──────────► add_item() ─────────► operations::add_line     │
//! │  Stepper +/- ──────────► increment/decrement ─► operations::adjust_qty  │
//! │  Edit line ────────────► update_item() ──────► operations::update_mod.  │
//! │  Tick store box ───────► toggle_store_sel. ──► selection::toggle_group  │
//! │                                │                                        │
//! │                                ▼                                        │
//! │                  CartStore::update (atomic swap)                        │
//! │                                │                                        │
//! │                 ┌──────────────┼──────────────┐                         │
//! │                 ▼              ▼              ▼                         │
//! │             rejected       unchanged       changed                      │
//! │            (debug log)     (nothing)   notify listeners                 │
//! │                                        then gateway.save(current)       │
//! │                                                                         │
//! │  Every command returns the snapshot that is live afterwards.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejected commands never surface as errors: the cart simply stays as it
//! was. Checkout and stock validation belong to the payment side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use satchel_core::{
    operations, pricing, selection, CartItem, CartKind, CartSnapshot, CartTotals, CoreResult,
    LineModifiers, Money, ProductRef, SubtotalScope, VendorGroup,
};
use satchel_db::KeyValueStore;
use satchel_persist::{PersistConfig, PersistenceGateway};

use crate::broadcaster::Subscription;
use crate::store::CartStore;

pub struct CartFacade<S: KeyValueStore> {
    kind: CartKind,
    store: CartStore,
    gateway: PersistenceGateway<S>,
    hydrated: AtomicBool,
}

impl<S: KeyValueStore> CartFacade<S> {
    /// Creates an empty cart of `kind` persisted into `storage`.
    ///
    /// Must be called inside a Tokio runtime. Call [`hydrate`](Self::hydrate)
    /// once at startup to restore the previous session's cart.
    pub fn new(storage: S, kind: CartKind, config: &PersistConfig) -> Self {
        CartFacade {
            kind,
            store: CartStore::new(),
            gateway: PersistenceGateway::start(storage, kind, config),
            hydrated: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> CartKind {
        self.kind
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Restores the saved cart, at most once.
    ///
    /// If any command already changed the cart before the load resolved,
    /// the in-memory cart wins and the saved one is dropped. Seeding
    /// notifies listeners once and doesn't write anything back.
    ///
    /// Returns whether the store was seeded.
    pub async fn hydrate(&self) -> bool {
        let loaded = self.gateway.load_once().await;

        if self.hydrated.swap(true, Ordering::SeqCst) {
            return false;
        }

        let Some(snapshot) = loaded else {
            return false;
        };

        let lines = snapshot.len();
        if self.store.seed(snapshot) {
            info!(kind = %self.kind, lines, "Cart restored");
            true
        } else {
            info!(kind = %self.kind, "Cart changed before restore finished, saved cart dropped");
            false
        }
    }

    /// Writes any pending save now.
    pub async fn flush(&self) {
        self.gateway.flush().await;
    }

    /// Flushes and stops persistence. The cart stays usable in memory.
    pub async fn shutdown(&self) {
        self.gateway.shutdown().await;
    }

    /// Registers a change listener (re-render hook).
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartSnapshot) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Number of replacements since startup.
    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn cart_items(&self) -> Arc<CartSnapshot> {
        self.store.current()
    }

    /// Sum of quantities (cart badge).
    pub fn item_count(&self) -> i64 {
        pricing::item_count(&self.store.current())
    }

    pub fn line_count(&self) -> usize {
        self.store.current().len()
    }

    /// Subtotal over every line.
    pub fn subtotal(&self) -> Money {
        pricing::cart_subtotal(&self.store.current(), SubtotalScope::All)
    }

    /// Subtotal over the lines selected for checkout.
    pub fn selected_subtotal(&self) -> Money {
        pricing::cart_subtotal(&self.store.current(), SubtotalScope::Selected)
    }

    /// Subtotal within `scope` plus the given fees.
    pub fn get_total(&self, scope: SubtotalScope, extra_fees: &[Money]) -> Money {
        pricing::cart_total(&self.store.current(), scope, extra_fees)
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(&*self.store.current())
    }

    /// Total quantity of a product over all its lines.
    pub fn get_item_quantity(&self, product_id: &str) -> i64 {
        self.store.current().quantity_of(product_id)
    }

    pub fn vendor_groups(&self) -> Vec<VendorGroup> {
        selection::vendor_groups(&self.store.current())
    }

    /// Lines handed to checkout.
    pub fn checkout_lines(&self) -> Vec<CartItem> {
        selection::checkout_lines(&self.store.current())
    }

    pub fn is_all_selected(&self) -> bool {
        selection::is_all_selected(&self.store.current())
    }

    pub fn selected_count(&self) -> usize {
        pricing::selected_count(&self.store.current())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub fn add_item(&self, product: &ProductRef, quantity: i64, modifiers: LineModifiers) -> Arc<CartSnapshot> {
        self.apply("add_item", |cart| {
            operations::add_line(cart, product, quantity, modifiers)
        })
    }

    pub fn remove_item(&self, line_id: &str) -> Arc<CartSnapshot> {
        self.apply("remove_item", |cart| Ok(operations::remove_line(cart, line_id)))
    }

    /// Sets a line's quantity; zero or less removes it.
    pub fn update_quantity(&self, line_id: &str, quantity: i64) -> Arc<CartSnapshot> {
        self.apply("update_quantity", |cart| {
            operations::set_quantity(cart, line_id, quantity)
        })
    }

    /// Replaces a line's modifiers and quantity (edit line flow).
    pub fn update_item(&self, line_id: &str, quantity: i64, modifiers: LineModifiers) -> Arc<CartSnapshot> {
        self.apply("update_item", |cart| {
            operations::update_modifiers(cart, line_id, quantity, modifiers)
        })
    }

    pub fn increment_item(&self, line_id: &str) -> Arc<CartSnapshot> {
        self.apply("increment_item", |cart| {
            operations::adjust_quantity(cart, line_id, 1)
        })
    }

    /// Removes the line when it drops to zero.
    pub fn decrement_item(&self, line_id: &str) -> Arc<CartSnapshot> {
        self.apply("decrement_item", |cart| {
            operations::adjust_quantity(cart, line_id, -1)
        })
    }

    pub fn clear_cart(&self) -> Arc<CartSnapshot> {
        self.apply("clear_cart", |cart| Ok(operations::clear(cart)))
    }

    // =========================================================================
    // Selection (marketplace only; no-ops on a food cart)
    // =========================================================================

    pub fn toggle_selection(&self, line_id: &str) -> Arc<CartSnapshot> {
        self.apply_selection("toggle_selection", |cart| {
            selection::toggle_line(cart, line_id)
        })
    }

    /// Toggles every line of one vendor.
    pub fn toggle_store_selection(&self, vendor: &str) -> Arc<CartSnapshot> {
        self.apply_selection("toggle_store_selection", |cart| {
            selection::toggle_group(cart, vendor)
        })
    }

    pub fn select_all(&self, value: bool) -> Arc<CartSnapshot> {
        self.apply_selection("select_all", |cart| selection::select_all(cart, value))
    }

    pub fn remove_selected(&self) -> Arc<CartSnapshot> {
        self.apply_selection("remove_selected", selection::remove_selected)
    }

    fn apply_selection(
        &self,
        command: &'static str,
        f: impl FnOnce(&CartSnapshot) -> CartSnapshot,
    ) -> Arc<CartSnapshot> {
        let kind = self.kind;
        self.apply(command, |cart| {
            selection::ensure_supported(kind)?;
            Ok(f(cart))
        })
    }

    fn apply<F>(&self, command: &'static str, f: F) -> Arc<CartSnapshot>
    where
        F: FnOnce(&CartSnapshot) -> CoreResult<CartSnapshot>,
    {
        match self.store.update(f) {
            Ok(Some(next)) => {
                debug!(
                    command,
                    kind = %self.kind,
                    lines = next.len(),
                    revision = self.store.revision(),
                    "Cart updated"
                );
                // Listeners may have changed the cart again; persist what is
                // live now.
                let live = self.store.current();
                self.gateway.save(Arc::clone(&live));
                live
            }
            Ok(None) => {
                debug!(command, kind = %self.kind, "Cart command changed nothing");
                self.store.current()
            }
            Err(e) => {
                debug!(command, kind = %self.kind, error = %e, "Cart command rejected");
                self.store.current()
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
