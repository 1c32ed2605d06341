//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Smallest currency unit                                   │
//! │    Rp 25.000 is stored as 25000, $10.99 as 1099                         │
//! │    Line subtotals are exact: (unit + deltas) × quantity                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Formatting for display (symbol, decimal places) is the app's job, see
//! the CLI's `AppConfig::format_currency`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// ProductRef.price ─┬─► unit price ──► CartItem.subtotal ──► cart subtotal
/// Variant.price_delta┤                                            │
/// Addon.price ───────┘                                extra fees ─┴─► total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    ///
    /// ## Example
    /// ```rust
    /// use satchel_core::money::Money;
    ///
    /// let price = Money::from_minor(25_000);
    /// assert_eq!(price.minor(), 25_000);
    /// ```
    #[inline]
    pub const fn from_minor(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the value in the smallest currency unit.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, clamping at the `i64` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use satchel_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(35_000);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 105_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Multiplies by a quantity, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use satchel_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(35_000).checked_mul(3), Some(Money::from_minor(105_000)));
    /// assert_eq!(Money::from_minor(i64::MAX / 2).checked_mul(3), None);
    /// ```
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds two amounts, clamping at the `i64` bounds.
    #[inline]
    pub const fn saturating_add(&self, other: Money) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Raw minor units. Use the app's currency formatter for UI display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(25_000);
        assert_eq!(money.minor(), 25_000);
        assert_eq!(money.to_string(), "25000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);

        let mut c = a;
        c += b;
        c -= Money::from_minor(200);
        assert_eq!(c.minor(), 1300);
    }

    #[test]
    fn test_sum() {
        let fees = [Money::from_minor(10_000), Money::from_minor(2_000)];
        let total: Money = fees.iter().sum();
        assert_eq!(total.minor(), 12_000);

        let empty: Money = Vec::<Money>::new().into_iter().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_checked_arithmetic() {
        let big = Money::from_minor(i64::MAX - 1);

        assert_eq!(big.checked_add(Money::from_minor(1)), Some(Money::from_minor(i64::MAX)));
        assert_eq!(big.checked_add(Money::from_minor(2)), None);
        assert_eq!(Money::from_minor(i64::MAX / 2).checked_mul(3), None);
        assert_eq!(Money::from_minor(-7).checked_mul(2), Some(Money::from_minor(-14)));
        assert_eq!(big.saturating_add(Money::from_minor(10)).minor(), i64::MAX);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_minor(1).is_positive());
        assert!(Money::from_minor(-1).is_negative());
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Money::from_minor(35_000)).unwrap();
        assert_eq!(json, "35000");
    }
}
