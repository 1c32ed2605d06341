//! # Cart Operations
//!
//! Pure snapshot-in/snapshot-out cart commands.
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Commands                                        │
//! │                                                                         │
//! │  Screen Action            Command              Snapshot Change          │
//! │  ─────────────            ───────              ───────────────          │
//! │                                                                         │
//! │  "Add to cart" ─────────► add_line() ────────► merge or append         │
//! │                                                                         │
//! │  Stepper +/- ───────────► set_quantity() ────► replace line (q ≤ 0:    │
//! │                           adjust_quantity()     remove)                 │
//! │                                                                         │
//! │  "Edit" sheet ──────────► update_modifiers() ► replace line, same id   │
//! │                                                                         │
//! │  Trash icon ────────────► remove_line() ─────► drop line               │
//! │                                                                         │
//! │  After checkout ────────► clear() ───────────► empty snapshot          │
//! │                                                                         │
//! │  NOTE: inputs are never modified. `Err` means "keep the old snapshot". │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::{CartItem, CartSnapshot, LineIdentity, LineModifiers, ProductRef};
use crate::validation::{
    check_line_quantity, check_room_for_line, validate_add_quantity, validate_notes,
    validate_product_ref,
};

/// Adds `quantity` units of a product with the given modifiers.
///
/// ## Behavior
/// - A line with the same [`LineIdentity`] exists: its quantity grows by
///   `quantity`, its line id, frozen product, notes and selection stay
/// - Otherwise: a new selected line is appended at the end
///
/// ## Errors
/// - `quantity <= 0` or above the per-line maximum
/// - invalid product reference or notes
/// - unit price below zero, above [`crate::MAX_UNIT_PRICE`] or overflowing
/// - merged quantity above the per-line maximum
/// - cart already holds the maximum number of lines
pub fn add_line(
    snapshot: &CartSnapshot,
    product: &ProductRef,
    quantity: i64,
    modifiers: LineModifiers,
) -> CoreResult<CartSnapshot> {
    validate_add_quantity(quantity)?;
    validate_product_ref(product)?;
    validate_notes(modifiers.notes.as_deref())?;

    let identity = LineIdentity::new(&product.id, modifiers.variant.as_ref(), &modifiers.addons);

    if let Some(pos) = snapshot.position_of_identity(&identity) {
        let existing = &snapshot.items()[pos];
        let merged = existing.quantity() + quantity;
        check_line_quantity(merged)?;
        return Ok(replace_at(snapshot, pos, existing.with_quantity(merged)?));
    }

    check_room_for_line(snapshot.len())?;

    let item = CartItem::new(product, quantity, modifiers)?;

    let mut items = snapshot.items().to_vec();
    items.push(item);
    Ok(CartSnapshot::from_items(items))
}

/// Removes the line with this id. Absent ids are a no-op.
pub fn remove_line(snapshot: &CartSnapshot, line_id: &str) -> CartSnapshot {
    CartSnapshot::from_items(
        snapshot
            .iter()
            .filter(|i| i.line_id() != line_id)
            .cloned()
            .collect(),
    )
}

/// Sets the quantity of a line, keeping its modifiers.
///
/// A quantity of zero or less is exactly [`remove_line`].
pub fn set_quantity(snapshot: &CartSnapshot, line_id: &str, quantity: i64) -> CoreResult<CartSnapshot> {
    if quantity <= 0 {
        return Ok(remove_line(snapshot, line_id));
    }

    let pos = find(snapshot, line_id)?;
    check_line_quantity(quantity)?;

    let updated = snapshot.items()[pos].with_quantity(quantity)?;
    Ok(replace_at(snapshot, pos, updated))
}

/// Moves a line's quantity by `delta` (stepper buttons).
///
/// Going to zero or below removes the line.
pub fn adjust_quantity(snapshot: &CartSnapshot, line_id: &str, delta: i64) -> CoreResult<CartSnapshot> {
    let pos = find(snapshot, line_id)?;
    let current = snapshot.items()[pos].quantity();
    set_quantity(snapshot, line_id, current.saturating_add(delta))
}

/// Replaces variant, add-ons, notes and quantity of a line in one step.
///
/// The line keeps its id and position and is NOT merged with another line,
/// even when its new identity equals the identity of another line. A
/// quantity of zero or less removes the line.
pub fn update_modifiers(
    snapshot: &CartSnapshot,
    line_id: &str,
    quantity: i64,
    modifiers: LineModifiers,
) -> CoreResult<CartSnapshot> {
    if quantity <= 0 {
        return Ok(remove_line(snapshot, line_id));
    }

    let pos = find(snapshot, line_id)?;
    check_line_quantity(quantity)?;
    validate_notes(modifiers.notes.as_deref())?;

    let updated = snapshot.items()[pos].with_modifiers(quantity, modifiers)?;

    Ok(replace_at(snapshot, pos, updated))
}

/// Returns an empty snapshot.
pub fn clear(_snapshot: &CartSnapshot) -> CartSnapshot {
    CartSnapshot::empty()
}

// =============================================================================
// Helpers
// =============================================================================

fn find(snapshot: &CartSnapshot, line_id: &str) -> CoreResult<usize> {
    snapshot
        .position(line_id)
        .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))
}

fn replace_at(snapshot: &CartSnapshot, pos: usize, item: CartItem) -> CartSnapshot {
    let mut items = snapshot.items().to_vec();
    items[pos] = item;
    CartSnapshot::from_items(items)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::money::Money;
    use crate::pricing::{cart_subtotal, line_subtotal, SubtotalScope};
    use crate::types::{Addon, Variant};
    use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_UNIT_PRICE};

    fn p1() -> ProductRef {
        ProductRef::new("P1", "Nasi Goreng", Money::from_minor(25_000))
    }

    fn large() -> Variant {
        Variant::new("V-L", "Large", Money::from_minor(10_000))
    }

    fn addon(id: &str, price: i64) -> Addon {
        Addon::new(id, id, Money::from_minor(price))
    }

    fn assert_subtotals_hold(snapshot: &CartSnapshot) {
        for item in snapshot {
            assert_eq!(item.subtotal(), line_subtotal(item));
            assert_eq!(item.subtotal(), item.unit_price() * item.quantity());
            assert!(item.quantity() >= 1);
        }
    }

    #[test]
    fn test_add_then_merge_then_distinct_variant() {
        let cart = CartSnapshot::empty();

        let cart = add_line(&cart, &p1(), 2, LineModifiers::none()).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity(), 2);
        assert_eq!(cart.items()[0].subtotal().minor(), 50_000);

        let first_id = cart.items()[0].line_id().to_string();
        let cart = add_line(&cart, &p1(), 1, LineModifiers::none()).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].line_id(), first_id);
        assert_eq!(cart.items()[0].quantity(), 3);
        assert_eq!(cart.items()[0].subtotal().minor(), 75_000);

        let cart = add_line(&cart, &p1(), 1, LineModifiers::none().with_variant(large())).unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[1].subtotal().minor(), 35_000);
        assert_eq!(cart_subtotal(&cart, SubtotalScope::All).minor(), 110_000);

        let cart = set_quantity(&cart, &first_id, 0).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart_subtotal(&cart, SubtotalScope::All).minor(), 35_000);
        assert_subtotals_hold(&cart);
    }

    #[test]
    fn test_merge_ignores_addon_order_and_notes() {
        let cart = add_line(
            &CartSnapshot::empty(),
            &p1(),
            1,
            LineModifiers::none()
                .with_addons([addon("egg", 4_000), addon("cheese", 3_000)])
                .with_notes("no chili"),
        )
        .unwrap();
        let cart = add_line(
            &cart,
            &p1(),
            2,
            LineModifiers::none()
                .with_addons([addon("cheese", 3_000), addon("egg", 4_000)])
                .with_notes("extra chili"),
        )
        .unwrap();

        assert_eq!(cart.len(), 1);
        let line = &cart.items()[0];
        assert_eq!(line.quantity(), 3);
        assert_eq!(line.notes(), Some("no chili"));
        assert_eq!(line.subtotal().minor(), 32_000 * 3);
    }

    #[test]
    fn test_different_addon_set_is_a_new_line() {
        let cart = add_line(
            &CartSnapshot::empty(),
            &p1(),
            1,
            LineModifiers::none().with_addon(addon("egg", 4_000)),
        )
        .unwrap();
        let cart = add_line(&cart, &p1(), 1, LineModifiers::none()).unwrap();
        let cart = add_line(
            &cart,
            &p1(),
            1,
            LineModifiers::none().with_addons([addon("egg", 4_000), addon("cheese", 3_000)]),
        )
        .unwrap();

        assert_eq!(cart.len(), 3);
        assert_subtotals_hold(&cart);
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let cart = add_line(&CartSnapshot::empty(), &p1(), 1, LineModifiers::none()).unwrap();
        assert!(add_line(&cart, &p1(), 0, LineModifiers::none()).is_err());
        assert!(add_line(&cart, &p1(), -3, LineModifiers::none()).is_err());
        assert_eq!(cart.items()[0].quantity(), 1);
    }

    #[test]
    fn test_add_rejects_merge_over_limit() {
        let cart = add_line(&CartSnapshot::empty(), &p1(), MAX_ITEM_QUANTITY, LineModifiers::none()).unwrap();
        let err = add_line(&cart, &p1(), 1, LineModifiers::none()).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
    }

    #[test]
    fn test_add_rejects_new_line_when_full() {
        let mut cart = CartSnapshot::empty();
        for i in 0..MAX_CART_LINES {
            let product = ProductRef::new(format!("P{i}"), "Item", Money::from_minor(1_000));
            cart = add_line(&cart, &product, 1, LineModifiers::none()).unwrap();
        }
        let extra = ProductRef::new("EXTRA", "Item", Money::from_minor(1_000));
        assert_eq!(
            add_line(&cart, &extra, 1, LineModifiers::none()),
            Err(CoreError::CartTooLarge { max: MAX_CART_LINES })
        );
        // merging into an existing line still works on a full cart
        assert!(add_line(&cart, &ProductRef::new("P0", "Item", Money::from_minor(1_000)), 1, LineModifiers::none()).is_ok());
    }

    #[test]
    fn test_add_rejects_negative_unit_price() {
        let cheap = Variant::new("V-S", "Small", Money::from_minor(-30_000));
        assert!(add_line(&CartSnapshot::empty(), &p1(), 1, LineModifiers::none().with_variant(cheap)).is_err());
    }

    #[test]
    fn test_add_rejects_prices_beyond_money_range() {
        let absurd = ProductRef::new("P9", "Yacht", Money::from_minor(i64::MAX / 2));
        assert!(matches!(
            add_line(&CartSnapshot::empty(), &absurd, 3, LineModifiers::none()),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let gold = Addon::new("A9", "Gold leaf", Money::from_minor(i64::MAX));
        let modifiers = LineModifiers::none().with_addons([gold.clone(), gold]);
        assert_eq!(
            add_line(&CartSnapshot::empty(), &p1(), 1, modifiers),
            Err(CoreError::AmountOverflow)
        );

        let pricey = Addon::new("A8", "Truffle", Money::from_minor(MAX_UNIT_PRICE));
        assert!(matches!(
            add_line(&CartSnapshot::empty(), &p1(), 1, LineModifiers::none().with_addon(pricey)),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_update_modifiers_rejects_overflowing_addons() {
        let cart = add_line(&CartSnapshot::empty(), &p1(), 2, LineModifiers::none()).unwrap();
        let id = cart.items()[0].line_id().to_string();
        let gold = Addon::new("A9", "Gold leaf", Money::from_minor(i64::MAX));

        assert_eq!(
            update_modifiers(&cart, &id, 2, LineModifiers::none().with_addons([gold.clone(), gold])),
            Err(CoreError::AmountOverflow)
        );
    }

    #[test]
    fn test_adjust_quantity_with_extreme_delta() {
        let cart = add_line(&CartSnapshot::empty(), &p1(), 2, LineModifiers::none()).unwrap();
        let id = cart.items()[0].line_id().to_string();

        assert!(matches!(
            adjust_quantity(&cart, &id, i64::MAX),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert!(adjust_quantity(&cart, &id, i64::MIN).unwrap().is_empty());
    }

    #[test]
    fn test_set_quantity_non_positive_equals_remove() {
        let cart = add_line(&CartSnapshot::empty(), &p1(), 2, LineModifiers::none()).unwrap();
        let cart = add_line(&cart, &p1(), 1, LineModifiers::none().with_variant(large())).unwrap();
        let id = cart.items()[0].line_id().to_string();

        for q in [0, -1, -50] {
            assert_eq!(set_quantity(&cart, &id, q).unwrap(), remove_line(&cart, &id));
        }
        // also for ids that are not in the cart
        assert_eq!(set_quantity(&cart, "nope", 0).unwrap(), remove_line(&cart, "nope"));
    }

    #[test]
    fn test_set_quantity_unknown_line_is_rejected() {
        let cart = add_line(&CartSnapshot::empty(), &p1(), 2, LineModifiers::none()).unwrap();
        assert_eq!(
            set_quantity(&cart, "missing", 4),
            Err(CoreError::LineNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_set_quantity_keeps_modifiers() {
        let cart = add_line(
            &CartSnapshot::empty(),
            &p1(),
            1,
            LineModifiers::none().with_variant(large()).with_notes("hot"),
        )
        .unwrap();
        let id = cart.items()[0].line_id().to_string();

        let cart = set_quantity(&cart, &id, 4).unwrap();
        let line = cart.get(&id).unwrap();
        assert_eq!(line.quantity(), 4);
        assert_eq!(line.variant(), Some(&large()));
        assert_eq!(line.notes(), Some("hot"));
        assert_eq!(line.subtotal().minor(), 140_000);
    }

    #[test]
    fn test_adjust_quantity() {
        let cart = add_line(&CartSnapshot::empty(), &p1(), 1, LineModifiers::none()).unwrap();
        let id = cart.items()[0].line_id().to_string();

        let cart = adjust_quantity(&cart, &id, 1).unwrap();
        assert_eq!(cart.get(&id).unwrap().quantity(), 2);

        let cart = adjust_quantity(&cart, &id, -2).unwrap();
        assert!(cart.is_empty());

        assert!(adjust_quantity(&cart, &id, 1).is_err());
    }

    #[test]
    fn test_update_modifiers_keeps_id_and_does_not_remerge() {
        let cart = add_line(&CartSnapshot::empty(), &p1(), 1, LineModifiers::none()).unwrap();
        let cart = add_line(&cart, &p1(), 1, LineModifiers::none().with_variant(large())).unwrap();
        let plain_id = cart.items()[0].line_id().to_string();

        // edit the plain line into the same identity as the large line
        let cart = update_modifiers(
            &cart,
            &plain_id,
            2,
            LineModifiers::none().with_variant(large()).with_notes("edited"),
        )
        .unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].line_id(), plain_id);
        assert_eq!(cart.items()[0].identity(), cart.items()[1].identity());
        assert_eq!(cart.items()[0].subtotal().minor(), 70_000);
        assert_eq!(cart.items()[0].notes(), Some("edited"));
        assert_subtotals_hold(&cart);
    }

    #[test]
    fn test_update_modifiers_unknown_line_and_zero_quantity() {
        let cart = add_line(&CartSnapshot::empty(), &p1(), 1, LineModifiers::none()).unwrap();
        assert!(update_modifiers(&cart, "missing", 1, LineModifiers::none()).is_err());

        let id = cart.items()[0].line_id().to_string();
        assert!(update_modifiers(&cart, &id, 0, LineModifiers::none()).unwrap().is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let cart = add_line(&CartSnapshot::empty(), &p1(), 1, LineModifiers::none()).unwrap();
        assert_eq!(remove_line(&cart, "missing"), cart);

        let id = cart.items()[0].line_id().to_string();
        assert!(remove_line(&cart, &id).is_empty());
        assert!(clear(&cart).is_empty());
        // input untouched
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let tea = ProductRef::new("P2", "Tea", Money::from_minor(8_000));
        let cart = add_line(&CartSnapshot::empty(), &p1(), 1, LineModifiers::none()).unwrap();
        let cart = add_line(&cart, &tea, 1, LineModifiers::none()).unwrap();
        let cart = add_line(&cart, &p1(), 1, LineModifiers::none()).unwrap();

        let ids: Vec<&str> = cart.iter().map(|i| i.product().id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
    }
}
