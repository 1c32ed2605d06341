//! # Pricing
//!
//! Derives line subtotals and cart-level totals from a snapshot.
//!
//! ```text
//! line subtotal = (price + variant delta + Σ add-ons) × quantity
//! cart subtotal = Σ line subtotals           (all lines, or selected only)
//! cart total    = cart subtotal + Σ extra fees
//! ```
//!
//! Fees (delivery, service, packaging...) are opaque amounts supplied by the
//! caller. Integer arithmetic only, nothing is rounded.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CartItem, CartSnapshot};

/// Which lines a subtotal covers.
///
/// Callers must say which one they need: the cart badge shows `All`, the
/// marketplace checkout bar shows `Selected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtotalScope {
    All,
    Selected,
}

impl SubtotalScope {
    fn includes(&self, item: &CartItem) -> bool {
        match self {
            SubtotalScope::All => true,
            SubtotalScope::Selected => item.is_selected(),
        }
    }
}

/// `(unit price + variant delta + Σ add-ons) × quantity`.
pub fn line_subtotal(item: &CartItem) -> Money {
    item.unit_price().multiply_quantity(item.quantity())
}

/// Sum of line subtotals within `scope`.
pub fn cart_subtotal(snapshot: &CartSnapshot, scope: SubtotalScope) -> Money {
    snapshot
        .iter()
        .filter(|i| scope.includes(i))
        .map(CartItem::subtotal)
        .sum()
}

/// Subtotal within `scope` plus every extra fee.
pub fn cart_total(snapshot: &CartSnapshot, scope: SubtotalScope, extra_fees: &[Money]) -> Money {
    extra_fees
        .iter()
        .fold(cart_subtotal(snapshot, scope), |total, fee| total.saturating_add(*fee))
}

/// Sum of quantities over all lines (the cart badge number).
pub fn item_count(snapshot: &CartSnapshot) -> i64 {
    snapshot.iter().map(CartItem::quantity).sum()
}

/// Number of selected lines.
pub fn selected_count(snapshot: &CartSnapshot) -> usize {
    snapshot.iter().filter(|i| i.is_selected()).count()
}

/// Cart totals summary for screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub item_count: i64,
    pub subtotal: Money,
    pub selected_subtotal: Money,
    pub selected_count: usize,
    pub all_selected: bool,
}

impl From<&CartSnapshot> for CartTotals {
    fn from(snapshot: &CartSnapshot) -> Self {
        CartTotals {
            line_count: snapshot.len(),
            item_count: item_count(snapshot),
            subtotal: cart_subtotal(snapshot, SubtotalScope::All),
            selected_subtotal: cart_subtotal(snapshot, SubtotalScope::Selected),
            selected_count: selected_count(snapshot),
            all_selected: crate::selection::is_all_selected(snapshot),
        }
    }
}
