//! # Checkout Selection (marketplace cart)
//!
//! Every line carries a `selected` flag marking it for checkout.
//!
//! ## Line State Machine
//! ```text
//!   add_line ──► [selected] ◄──── toggle ────► [unselected]
//!                    │                              │
//!                    └──── remove / remove_selected / clear ──► (gone)
//! ```
//!
//! Group operations work on the vendor key of each line (lines without a
//! vendor form the `""` group). Like [`crate::operations`], every function
//! returns a new snapshot and leaves its input alone.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartItem, CartKind, CartSnapshot};

/// Rejects selection commands on carts that don't support them.
pub fn ensure_supported(kind: CartKind) -> CoreResult<()> {
    if kind.selection_enabled() {
        Ok(())
    } else {
        Err(CoreError::SelectionUnsupported(kind.to_string()))
    }
}

/// Flips `selected` on one line. Unknown ids are a no-op.
pub fn toggle_line(snapshot: &CartSnapshot, line_id: &str) -> CartSnapshot {
    map_lines(snapshot, |item| {
        if item.line_id() == line_id {
            item.with_selected(!item.is_selected())
        } else {
            item.clone()
        }
    })
}

/// Flips the whole vendor group at once.
///
/// A fully selected group becomes fully unselected; any other group
/// (partially or not selected) becomes fully selected. Unknown groups are a
/// no-op.
pub fn toggle_group(snapshot: &CartSnapshot, group_key: &str) -> CartSnapshot {
    let mut members = snapshot.iter().filter(|i| i.vendor_key() == group_key).peekable();
    if members.peek().is_none() {
        return snapshot.clone();
    }

    let target = !members.all(CartItem::is_selected);
    map_lines(snapshot, |item| {
        if item.vendor_key() == group_key {
            item.with_selected(target)
        } else {
            item.clone()
        }
    })
}

/// Sets `selected = value` on every line.
pub fn select_all(snapshot: &CartSnapshot, value: bool) -> CartSnapshot {
    map_lines(snapshot, |item| item.with_selected(value))
}

/// Drops every selected line.
pub fn remove_selected(snapshot: &CartSnapshot) -> CartSnapshot {
    CartSnapshot::from_items(snapshot.iter().filter(|i| !i.is_selected()).cloned().collect())
}

/// True iff the cart is non-empty and every line is selected.
pub fn is_all_selected(snapshot: &CartSnapshot) -> bool {
    !snapshot.is_empty() && snapshot.iter().all(CartItem::is_selected)
}

/// The lines going to checkout, in cart order.
pub fn checkout_lines(snapshot: &CartSnapshot) -> Vec<CartItem> {
    snapshot.iter().filter(|i| i.is_selected()).cloned().collect()
}

// =============================================================================
// Vendor Groups
// =============================================================================

/// Lines of one vendor, as the cart screen renders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VendorGroup {
    /// Vendor name, `""` for lines without vendor.
    pub vendor: String,
    pub line_ids: Vec<String>,
    pub subtotal: Money,
    pub selected_subtotal: Money,
    pub all_selected: bool,
}

/// Groups lines by vendor, in order of each vendor's first line.
pub fn vendor_groups(snapshot: &CartSnapshot) -> Vec<VendorGroup> {
    let mut groups: Vec<VendorGroup> = Vec::new();

    for item in snapshot {
        let pos = match groups.iter().position(|g| g.vendor == item.vendor_key()) {
            Some(pos) => pos,
            None => {
                groups.push(VendorGroup {
                    vendor: item.vendor_key().to_string(),
                    line_ids: Vec::new(),
                    subtotal: Money::zero(),
                    selected_subtotal: Money::zero(),
                    all_selected: true,
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[pos];
        group.line_ids.push(item.line_id().to_string());
        group.subtotal += item.subtotal();
        if item.is_selected() {
            group.selected_subtotal += item.subtotal();
        } else {
            group.all_selected = false;
        }
    }

    groups
}

fn map_lines(snapshot: &CartSnapshot, f: impl Fn(&CartItem) -> CartItem) -> CartSnapshot {
    CartSnapshot::from_items(snapshot.iter().map(f).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
