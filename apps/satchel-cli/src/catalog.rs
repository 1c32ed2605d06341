//! # Demo Catalog
//!
//! A fixed product list so the shell has something to put in the cart.
//! Product fetching is someone else's job; the cart only ever sees a
//! [`ProductRef`] and the modifiers picked for it.

use satchel_core::{Addon, Money, ProductRef, Variant};

use crate::error::{CliError, CliResult};

/// One product with the variants and add-ons offered for it.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub product: ProductRef,
    pub variants: Vec<Variant>,
    pub addons: Vec<Addon>,
}

impl CatalogEntry {
    fn new(id: &str, name: &str, price: i64, vendor: &str) -> Self {
        CatalogEntry {
            product: ProductRef::new(id, name, Money::from_minor(price)).with_vendor(vendor),
            variants: Vec::new(),
            addons: Vec::new(),
        }
    }

    fn variant(mut self, id: &str, name: &str, delta: i64) -> Self {
        self.variants.push(Variant::new(id, name, Money::from_minor(delta)));
        self
    }

    fn addon(mut self, id: &str, name: &str, price: i64) -> Self {
        self.addons.push(Addon::new(id, name, Money::from_minor(price)));
        self
    }

    pub fn find_variant(&self, id: &str) -> CliResult<Variant> {
        self.variants
            .iter()
            .find(|v| v.id.eq_ignore_ascii_case(id))
            .cloned()
            .ok_or_else(|| CliError::UnknownModifier {
                product: self.product.id.clone(),
                kind: "variant",
                id: id.to_string(),
            })
    }

    pub fn find_addon(&self, id: &str) -> CliResult<Addon> {
        self.addons
            .iter()
            .find(|a| a.id.eq_ignore_ascii_case(id))
            .cloned()
            .ok_or_else(|| CliError::UnknownModifier {
                product: self.product.id.clone(),
                kind: "add-on",
                id: id.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Two food stalls and a drinks shop.
    pub fn demo() -> Self {
        Catalog {
            entries: vec![
                CatalogEntry::new("P1", "Nasi Goreng", 25_000, "Warung Bu Sri")
                    .variant("L", "Large", 10_000)
                    .variant("S", "Small", -5_000)
                    .addon("EGG", "Fried egg", 3_000)
                    .addon("KRP", "Krupuk", 2_000),
                CatalogEntry::new("P2", "Mie Ayam", 22_000, "Warung Bu Sri")
                    .variant("L", "Large", 8_000)
                    .addon("BAK", "Bakso", 5_000),
                CatalogEntry::new("P3", "Sate Ayam", 30_000, "Sate Pak Min")
                    .variant("10", "10 skewers", 0)
                    .variant("20", "20 skewers", 25_000)
                    .addon("LON", "Lontong", 4_000),
                CatalogEntry::new("D1", "Es Teh Manis", 6_000, "Kedai Segar")
                    .variant("L", "Large", 3_000)
                    .addon("LMN", "Lemon", 2_000),
                CatalogEntry::new("D2", "Kopi Susu", 18_000, "Kedai Segar")
                    .addon("SHT", "Extra shot", 6_000),
            ],
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Looks a product up by id, ignoring case.
    pub fn find(&self, id: &str) -> CliResult<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.product.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| CliError::UnknownProduct(id.to_string()))
    }
}
