//! # Validation Module
//!
//! Input validation for cart commands.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Screen (TypeScript)                                          │
//! │  └── Steppers never go below 1, buttons disabled when out of stock     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Quantity ranges, catalog reference sanity, cart size              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: CartFacade                                                   │
//! │  └── Any rejection becomes a no-op (snapshot unchanged)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, ValidationError};
use crate::money::Money;
use crate::types::ProductRef;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_UNIT_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of free-text line notes.
pub const MAX_NOTES_LEN: usize = 500;

// =============================================================================
// Quantity Validators
// =============================================================================

/// Validates a quantity passed to an add command.
///
/// ## Rules
/// - Must be positive (0 or negative additions are rejected)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
///
/// ## Example
/// ```rust
/// use satchel_core::validation::validate_add_quantity;
///
/// assert!(validate_add_quantity(2).is_ok());
/// assert!(validate_add_quantity(0).is_err());
/// assert!(validate_add_quantity(-1).is_err());
/// ```
pub fn validate_add_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Checks that a resulting line quantity stays within the per-line limit.
///
/// Merges and direct edits go through here; the lower bound is handled by
/// the callers (a quantity of zero or less removes the line).
pub fn check_line_quantity(quantity: i64) -> Result<(), CoreError> {
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Checks that one more line fits into a cart of `current_lines` lines.
pub fn check_room_for_line(current_lines: usize) -> Result<(), CoreError> {
    if current_lines >= MAX_CART_LINES {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_LINES,
        });
    }
    Ok(())
}

// =============================================================================
// Reference Validators
// =============================================================================

/// Validates a catalog product reference.
///
/// ## Rules
/// - Id and name must not be blank
/// - Price must be between 0 and [`MAX_UNIT_PRICE`]
///
/// ## Example
/// ```rust
/// use satchel_core::{validation::validate_product_ref, Money, ProductRef};
///
/// assert!(validate_product_ref(&ProductRef::new("P1", "Tea", Money::from_minor(8_000))).is_ok());
/// assert!(validate_product_ref(&ProductRef::new("", "Tea", Money::from_minor(8_000))).is_err());
/// ```
pub fn validate_product_ref(product: &ProductRef) -> ValidationResult<()> {
    if product.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product.id".to_string(),
        });
    }

    if product.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product.name".to_string(),
        });
    }

    if product.price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "product.price".to_string(),
        });
    }

    if product.price.minor() > MAX_UNIT_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "product.price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE,
        });
    }

    Ok(())
}

/// Validates the effective unit price of a line (price + variant + add-ons).
///
/// A variant may be cheaper than the base product, but the line as a whole
/// can never be worth less than nothing.
pub fn validate_unit_price(unit_price: Money) -> ValidationResult<()> {
    if unit_price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit price".to_string(),
        });
    }

    if unit_price.minor() > MAX_UNIT_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "unit price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE,
        });
    }

    Ok(())
}

/// Validates free-text notes attached to a line.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LEN => Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_quantity_bounds() {
        assert!(validate_add_quantity(1).is_ok());
        assert!(validate_add_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(matches!(
            validate_add_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_add_quantity(MAX_ITEM_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_line_quantity_limit() {
        assert!(check_line_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert_eq!(
            check_line_quantity(1000),
            Err(CoreError::QuantityTooLarge {
                requested: 1000,
                max: MAX_ITEM_QUANTITY
            })
        );
    }

    #[test]
    fn test_room_for_line() {
        assert!(check_room_for_line(0).is_ok());
        assert!(check_room_for_line(MAX_CART_LINES - 1).is_ok());
        assert!(check_room_for_line(MAX_CART_LINES).is_err());
    }

    #[test]
    fn test_product_ref_rules() {
        let ok = ProductRef::new("P1", "Tea", Money::from_minor(8_000));
        assert!(validate_product_ref(&ok).is_ok());

        let free = ProductRef::new("P0", "Sample", Money::zero());
        assert!(validate_product_ref(&free).is_ok());

        let blank_name = ProductRef::new("P1", "  ", Money::from_minor(8_000));
        assert!(validate_product_ref(&blank_name).is_err());

        let negative = ProductRef::new("P1", "Tea", Money::from_minor(-1));
        assert!(validate_product_ref(&negative).is_err());

        let priciest = ProductRef::new("P1", "Tea", Money::from_minor(MAX_UNIT_PRICE));
        assert!(validate_product_ref(&priciest).is_ok());

        let absurd = ProductRef::new("P1", "Tea", Money::from_minor(i64::MAX / 2));
        assert!(matches!(
            validate_product_ref(&absurd),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_unit_price_and_notes() {
        assert!(validate_unit_price(Money::zero()).is_ok());
        assert!(validate_unit_price(Money::from_minor(-500)).is_err());
        assert!(validate_unit_price(Money::from_minor(MAX_UNIT_PRICE)).is_ok());
        assert!(validate_unit_price(Money::from_minor(MAX_UNIT_PRICE + 1)).is_err());

        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some("extra spicy")).is_ok());
        let long = "x".repeat(MAX_NOTES_LEN + 1);
        assert!(validate_notes(Some(&long)).is_err());
    }
}
