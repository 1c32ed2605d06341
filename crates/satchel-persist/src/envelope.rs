//! # Persisted Cart Envelope
//!
//! The JSON document stored under a cart's key.
//!
//! ```json
//! {
//!   "version": 1,
//!   "kind": "marketplace",
//!   "savedAt": "2026-01-01T10:00:00Z",
//!   "items": [ { "lineId": "...", "product": { ... }, "quantity": 2, ... } ]
//! }
//! ```
//!
//! This is an internal format, not a compatibility surface. Anything that
//! doesn't decode cleanly is treated as "no saved cart".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use satchel_core::{CartItem, CartKind, CartSnapshot};

use crate::error::{PersistError, PersistResult};

/// Current envelope format version.
pub const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart {
    pub version: u32,
    pub kind: CartKind,
    pub saved_at: DateTime<Utc>,
    pub items: Vec<CartItem>,
}

impl PersistedCart {
    /// Wraps a snapshot for writing.
    pub fn new(kind: CartKind, snapshot: &CartSnapshot) -> Self {
        PersistedCart {
            version: ENVELOPE_VERSION,
            kind,
            saved_at: Utc::now(),
            items: snapshot.items().to_vec(),
        }
    }

    pub fn encode(&self) -> PersistResult<String> {
        serde_json::to_string(self).map_err(|e| PersistError::SerializationFailed(e.to_string()))
    }

    /// Parses a stored document and rebuilds a snapshot from it.
    ///
    /// ## Rejected
    /// - Invalid JSON or unexpected shape
    /// - `version` other than [`ENVELOPE_VERSION`]
    /// - `kind` other than `expected`
    /// - lines rejected by [`CartSnapshot::normalized`] (duplicate ids,
    ///   quantities or prices out of range, too many lines)
    ///
    /// Subtotals of accepted lines are recomputed and zero-quantity lines
    /// dropped.
    pub fn decode(json: &str, expected: CartKind) -> PersistResult<CartSnapshot> {
        let envelope: PersistedCart = serde_json::from_str(json)?;

        if envelope.version != ENVELOPE_VERSION {
            return Err(PersistError::UnsupportedVersion(envelope.version));
        }

        if envelope.kind != expected {
            return Err(PersistError::KindMismatch {
                expected,
                found: envelope.kind,
            });
        }

        Ok(CartSnapshot::normalized(envelope.items)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_core::operations::add_line;
    use satchel_core::{CoreError, LineModifiers, Money, ProductRef, Variant};

    fn snapshot() -> CartSnapshot {
        let p1 = ProductRef::new("P1", "Burger", Money::from_minor(25_000)).with_vendor("StoreA");
        let cart = add_line(&CartSnapshot::empty(), &p1, 2, LineModifiers::none()).unwrap();
        add_line(
            &cart,
            &p1,
            1,
            LineModifiers::none().with_variant(Variant::new("V-L", "Large", Money::from_minor(10_000))),
        )
        .unwrap()
    }

    #[test]
    fn test_encode_decode_preserves_snapshot() {
        let snap = snapshot();
        let json = PersistedCart::new(CartKind::Marketplace, &snap).encode().unwrap();

        assert!(json.contains(r#""version":1"#));
        assert!(json.contains(r#""kind":"marketplace""#));
        assert!(json.contains(r#""savedAt""#));

        let back = PersistedCart::decode(&json, CartKind::Marketplace).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let json = PersistedCart::new(CartKind::FoodOrder, &snapshot()).encode().unwrap();

        assert!(matches!(
            PersistedCart::decode(&json, CartKind::Marketplace),
            Err(PersistError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut envelope = PersistedCart::new(CartKind::Marketplace, &snapshot());
        envelope.version = 2;
        let json = envelope.encode().unwrap();

        assert!(matches!(
            PersistedCart::decode(&json, CartKind::Marketplace),
            Err(PersistError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        for json in ["", "null", "[]", r#"{"version":1}"#, "{{{"] {
            assert!(
                PersistedCart::decode(json, CartKind::Marketplace).is_err(),
                "accepted {json:?}"
            );
        }
    }

    #[test]
    fn test_tampered_subtotal_is_recomputed() {
        let json = PersistedCart::new(CartKind::Marketplace, &snapshot()).encode().unwrap();
        let tampered = json.replacen(r#""subtotal":50000"#, r#""subtotal":1"#, 1);
        assert_ne!(json, tampered);

        let back = PersistedCart::decode(&tampered, CartKind::Marketplace).unwrap();
        assert_eq!(back.items()[0].subtotal().minor(), 50_000);
    }

    #[test]
    fn test_zero_quantity_lines_dropped() {
        let json = PersistedCart::new(CartKind::Marketplace, &snapshot()).encode().unwrap();
        let tampered = json.replacen(r#""quantity":2"#, r#""quantity":0"#, 1);

        let back = PersistedCart::decode(&tampered, CartKind::Marketplace).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.items()[0].quantity(), 1);
    }

    fn stored(items: serde_json::Value) -> String {
        serde_json::json!({
            "version": 1,
            "kind": "marketplace",
            "savedAt": "2026-01-01T10:00:00Z",
            "items": items
        })
        .to_string()
    }

    fn line(line_id: &str, price: i64, quantity: i64) -> serde_json::Value {
        serde_json::json!({
            "lineId": line_id,
            "product": { "id": "P1", "name": "Burger", "price": price },
            "quantity": quantity,
            "subtotal": 0
        })
    }

    #[test]
    fn test_overflowing_quantity_rejected() {
        let json = stored(serde_json::json!([line("l1", 25_000, 9_000_000_000_000_000_000)]));

        assert!(matches!(
            PersistedCart::decode(&json, CartKind::Marketplace),
            Err(PersistError::InvalidCart(CoreError::QuantityTooLarge { .. }))
        ));
    }

    #[test]
    fn test_out_of_range_lines_rejected() {
        let cases = [
            serde_json::json!([line("l1", 25_000, 5_000)]),
            serde_json::json!([line("l1", -50_000, 2)]),
            serde_json::json!([line("l1", i64::MAX, 1)]),
            serde_json::json!([line("l1", 5_000, 2), line("l1", 25_000, 1)]),
        ];

        for items in cases {
            let json = stored(items);
            assert!(
                matches!(
                    PersistedCart::decode(&json, CartKind::Marketplace),
                    Err(PersistError::InvalidCart(_))
                ),
                "accepted {json}"
            );
        }
    }
}
