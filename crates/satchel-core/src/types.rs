//! # Cart Data Model
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Types                                      │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   ProductRef    │   │    CartItem     │   │  CartSnapshot   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  line_id (UUID) │◄──│  items (ordered)│       │
//! │  │  name, vendor   │   │  quantity ≥ 1   │   │  oldest first   │       │
//! │  │  price          │   │  variant/addons │   └─────────────────┘       │
//! │  └─────────────────┘   │  subtotal       │                              │
//! │   (catalog-owned,      │  selected       │   ┌─────────────────┐       │
//! │    never mutated)      └─────────────────┘   │  LineIdentity   │       │
//! │                                              │  product,       │       │
//! │                                              │  variant,       │       │
//! │                                              │  sorted addons  │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every line has:
//! - `line_id`: UUID v4, stable for the life of the line
//! - [`LineIdentity`]: decides whether two additions merge into one line

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{
    check_line_quantity, validate_notes, validate_product_ref, validate_unit_price,
};
use crate::MAX_CART_LINES;

// =============================================================================
// Catalog References
// =============================================================================

/// Read-only reference to a catalog product.
///
/// Owned by the catalog; the cart keeps a frozen copy and never changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductRef {
    /// Catalog product id.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Unit price in the smallest currency unit.
    pub price: Money,

    /// Store/vendor the product is sold by (marketplace grouping key).
    #[serde(default)]
    pub vendor: Option<String>,

    /// Display image URL.
    #[serde(default)]
    pub image: Option<String>,
}

impl ProductRef {
    /// Creates a product reference with no vendor or image.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        ProductRef {
            id: id.into(),
            name: name.into(),
            price,
            vendor: None,
            image: None,
        }
    }

    /// Sets the vendor.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    /// Sets the image URL.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// A product variant (size, portion, color...). Identity-bearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Variant {
    pub id: String,
    pub name: String,
    /// Added to the product's unit price. May be negative.
    pub price_delta: Money,
}

impl Variant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price_delta: Money) -> Self {
        Variant {
            id: id.into(),
            name: name.into(),
            price_delta,
        }
    }
}

/// An add-on (extra topping, gift wrap...). Identity-bearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Addon {
    pub id: String,
    pub name: String,
    pub price: Money,
}

impl Addon {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Addon {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

// =============================================================================
// Line Modifiers
// =============================================================================

/// Optional modifiers of a line.
///
/// `variant` and `addons` take part in [`LineIdentity`]; `notes` do not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineModifiers {
    #[serde(default)]
    pub variant: Option<Variant>,
    #[serde(default)]
    pub addons: Vec<Addon>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl LineModifiers {
    /// No variant, no add-ons, no notes.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    pub fn with_addon(mut self, addon: Addon) -> Self {
        self.addons.push(addon);
        self
    }

    pub fn with_addons(mut self, addons: impl IntoIterator<Item = Addon>) -> Self {
        self.addons.extend(addons);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

// =============================================================================
// Line Identity
// =============================================================================

/// The key deciding whether two additions merge into one line.
///
/// Add-on ids are sorted, so the order in which add-ons were picked does not
/// matter. Notes are not part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineIdentity {
    product_id: String,
    variant_id: Option<String>,
    addon_ids: Vec<String>,
}

impl LineIdentity {
    pub fn new(product_id: &str, variant: Option<&Variant>, addons: &[Addon]) -> Self {
        let mut addon_ids: Vec<String> = addons.iter().map(|a| a.id.clone()).collect();
        addon_ids.sort();

        LineIdentity {
            product_id: product_id.to_string(),
            variant_id: variant.map(|v| v.id.clone()),
            addon_ids,
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn variant_id(&self) -> Option<&str> {
        self.variant_id.as_deref()
    }

    pub fn addon_ids(&self) -> &[String] {
        &self.addon_ids
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// One line of the cart.
///
/// ## Invariants
/// - `quantity >= 1`
/// - `subtotal == (price + variant delta + Σ add-ons) × quantity`, recomputed
///   by every constructor; there is no setter
/// - `line_id` never changes for the life of the line
///
/// Items are only ever replaced inside a new [`CartSnapshot`], never mutated
/// in place, which is why every "change" method consumes or clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    line_id: String,
    product: ProductRef,
    quantity: i64,
    #[serde(default)]
    variant: Option<Variant>,
    #[serde(default)]
    addons: Vec<Addon>,
    #[serde(default)]
    notes: Option<String>,
    subtotal: Money,
    #[serde(default = "default_selected")]
    selected: bool,
}

fn default_selected() -> bool {
    true
}

impl CartItem {
    /// Creates a new line with a fresh `line_id`, selected.
    pub(crate) fn new(
        product: &ProductRef,
        quantity: i64,
        modifiers: LineModifiers,
    ) -> CoreResult<Self> {
        CartItem {
            line_id: Uuid::new_v4().to_string(),
            product: product.clone(),
            quantity,
            variant: modifiers.variant,
            addons: modifiers.addons,
            notes: modifiers.notes,
            subtotal: Money::zero(),
            selected: true,
        }
        .recomputed()
    }

    /// Same line, new quantity.
    pub(crate) fn with_quantity(&self, quantity: i64) -> CoreResult<Self> {
        CartItem {
            quantity,
            ..self.clone()
        }
        .recomputed()
    }

    /// Same line id and product, new modifiers and quantity.
    pub(crate) fn with_modifiers(
        &self,
        quantity: i64,
        modifiers: LineModifiers,
    ) -> CoreResult<Self> {
        CartItem {
            quantity,
            variant: modifiers.variant,
            addons: modifiers.addons,
            notes: modifiers.notes,
            ..self.clone()
        }
        .recomputed()
    }

    pub(crate) fn with_selected(&self, selected: bool) -> Self {
        CartItem {
            selected,
            ..self.clone()
        }
    }

    /// Checks the unit price and derives the subtotal from it.
    ///
    /// Fails with [`CoreError::AmountOverflow`] instead of wrapping when the
    /// price arithmetic leaves the `i64` range.
    fn recomputed(mut self) -> CoreResult<Self> {
        let unit = self.checked_unit_price()?;
        validate_unit_price(unit)?;
        self.subtotal = unit
            .checked_mul(self.quantity)
            .ok_or(CoreError::AmountOverflow)?;
        Ok(self)
    }

    fn checked_unit_price(&self) -> CoreResult<Money> {
        let variant_delta = self
            .variant
            .as_ref()
            .map(|v| v.price_delta)
            .unwrap_or_default();

        self.addons
            .iter()
            .try_fold(self.product.price, |sum, addon| sum.checked_add(addon.price))
            .and_then(|sum| sum.checked_add(variant_delta))
            .ok_or(CoreError::AmountOverflow)
    }

    /// Re-checks a line read from outside (storage) and re-derives its
    /// subtotal.
    ///
    /// ## Returns
    /// - `Ok(None)` for a line whose quantity is below one
    /// - `Err` for a line no command could have produced (blank product,
    ///   quantity over the limit, unit price out of range, notes too long)
    pub fn normalized(self) -> CoreResult<Option<Self>> {
        if self.quantity <= 0 {
            return Ok(None);
        }

        if self.line_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "lineId".to_string(),
            }
            .into());
        }

        validate_product_ref(&self.product)?;
        check_line_quantity(self.quantity)?;
        validate_notes(self.notes.as_deref())?;

        self.recomputed().map(Some)
    }

    pub fn line_id(&self) -> &str {
        &self.line_id
    }

    pub fn product(&self) -> &ProductRef {
        &self.product
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn variant(&self) -> Option<&Variant> {
        self.variant.as_ref()
    }

    pub fn addons(&self) -> &[Addon] {
        &self.addons
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Grouping key for store-level selection; lines without vendor share `""`.
    pub fn vendor_key(&self) -> &str {
        self.product.vendor.as_deref().unwrap_or("")
    }

    /// Price of one unit including variant delta and add-ons.
    pub fn unit_price(&self) -> Money {
        let variant_delta = self
            .variant
            .as_ref()
            .map(|v| v.price_delta)
            .unwrap_or_default();
        self.addons
            .iter()
            .fold(self.product.price.saturating_add(variant_delta), |sum, a| {
                sum.saturating_add(a.price)
            })
    }

    pub fn identity(&self) -> LineIdentity {
        LineIdentity::new(&self.product.id, self.variant.as_ref(), &self.addons)
    }

    pub fn modifiers(&self) -> LineModifiers {
        LineModifiers {
            variant: self.variant.clone(),
            addons: self.addons.clone(),
            notes: self.notes.clone(),
        }
    }
}

// =============================================================================
// Cart Snapshot
// =============================================================================

/// The complete cart at one point in time. Oldest line first.
///
/// A snapshot is the unit that gets replaced, broadcast and persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartSnapshot {
    items: Vec<CartItem>,
}

impl CartSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_items(items: Vec<CartItem>) -> Self {
        CartSnapshot { items }
    }

    /// Builds a snapshot from untrusted lines (e.g. storage).
    ///
    /// Subtotals are recomputed and lines with a quantity below one are
    /// dropped. Anything else that breaks a cart rule rejects the whole set:
    /// a bad line (see [`CartItem::normalized`]), a repeated `line_id`, or
    /// more than [`MAX_CART_LINES`] lines.
    pub fn normalized(items: Vec<CartItem>) -> CoreResult<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        let mut kept = Vec::with_capacity(items.len());

        for item in items {
            let Some(item) = item.normalized()? else {
                continue;
            };
            if !seen.insert(item.line_id.clone()) {
                return Err(CoreError::DuplicateLine(item.line_id));
            }
            kept.push(item);
        }

        if kept.len() > MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        Ok(CartSnapshot { items: kept })
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, line_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.line_id == line_id)
    }

    pub(crate) fn position(&self, line_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.line_id == line_id)
    }

    pub(crate) fn position_of_identity(&self, identity: &LineIdentity) -> Option<usize> {
        self.items.iter().position(|i| &i.identity() == identity)
    }

    /// Sum of quantities over every line of `product_id`, whatever the
    /// variant or add-ons.
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.items
            .iter()
            .filter(|i| i.product.id == product_id)
            .map(|i| i.quantity)
            .sum()
    }

}

impl<'a> IntoIterator for &'a CartSnapshot {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// =============================================================================
// Cart Kind
// =============================================================================

/// Which cart engine a snapshot belongs to.
///
/// Both kinds share one core; only the marketplace cart supports checkout
/// selection. Each kind persists under its own storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CartKind {
    /// General marketplace cart with per-line checkout selection.
    #[default]
    Marketplace,
    /// Food-ordering cart, everything in it is checked out.
    #[serde(rename = "food")]
    FoodOrder,
}

impl CartKind {
    pub fn selection_enabled(&self) -> bool {
        matches!(self, CartKind::Marketplace)
    }

    /// Suffix used to build the storage key of this cart.
    pub fn as_str(&self) -> &'static str {
        match self {
            CartKind::Marketplace => "marketplace",
            CartKind::FoodOrder => "food",
        }
    }
}

impl fmt::Display for CartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "marketplace" | "market" | "shop" => Ok(CartKind::Marketplace),
            "food" | "food_order" | "food-order" => Ok(CartKind::FoodOrder),
            _ => Err(ValidationError::NotAllowed {
                field: "cart kind".to_string(),
                allowed: vec!["marketplace".to_string(), "food".to_string()],
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
