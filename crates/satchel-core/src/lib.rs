//! # satchel-core: Pure Cart Logic for Satchel
//!
//! This crate is the **heart** of the cart engine. It contains all cart rules
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Satchel Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront screens                           │   │
//! │  │   Product page ──► Cart badge ──► Cart screen ──► Checkout     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              satchel-store (CartFacade)                         │   │
//! │  │    add_item, update_quantity, toggle_selection, ...            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ satchel-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌────────────┐ ┌──────────┐ ┌───────────────┐   │   │
//! │  │  │  types   │ │ operations │ │ pricing  │ │   selection   │   │   │
//! │  │  │ CartItem │ │  add_line  │ │ subtotal │ │ toggle_group  │   │   │
//! │  │  │ Snapshot │ │ set_qty    │ │ total    │ │ remove_sel.   │   │   │
//! │  │  └──────────┘ └────────────┘ └──────────┘ └───────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO LOGGING • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Data model (ProductRef, CartItem, CartSnapshot, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`operations`] - Snapshot-in/snapshot-out cart commands
//! - [`pricing`] - Subtotals, totals, summaries
//! - [`selection`] - Marketplace checkout selection
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Snapshots are values**: every command returns a new [`CartSnapshot`],
//!    the input is never touched
//! 2. **No I/O**: storage, logging and async live in other crates
//! 3. **Integer Money**: all amounts are in the smallest currency unit (i64)
//! 4. **Explicit Errors**: rejected commands come back as typed errors
//!
//! ## Example Usage
//!
//! ```rust
//! use satchel_core::{operations, pricing, LineModifiers, Money, ProductRef};
//! use satchel_core::{CartSnapshot, SubtotalScope};
//!
//! let nasi = ProductRef::new("P1", "Nasi Goreng", Money::from_minor(25_000));
//!
//! let cart = CartSnapshot::empty();
//! let cart = operations::add_line(&cart, &nasi, 2, LineModifiers::none()).unwrap();
//! let cart = operations::add_line(&cart, &nasi, 1, LineModifiers::none()).unwrap();
//!
//! assert_eq!(cart.len(), 1);
//! assert_eq!(pricing::cart_subtotal(&cart, SubtotalScope::All).minor(), 75_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod operations;
pub mod pricing;
pub mod selection;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{CartTotals, SubtotalScope};
pub use selection::VendorGroup;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of distinct lines in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps persisted snapshots small.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum price of one unit of a line, in minor units.
///
/// ## Business Reason
/// Keeps `price × quantity` and cart sums far from the `i64` limits.
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000_000;
