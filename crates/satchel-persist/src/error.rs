//! # Persistence Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Storage      │  │      Envelope           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Storage        │  │  SerializationFailed    │ │
//! │  │  ConfigLoad...  │  │                 │  │  DeserializationFailed  │ │
//! │  │  ConfigSave...  │  │                 │  │  UnsupportedVersion     │ │
//! │  │                 │  │                 │  │  KindMismatch           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage and envelope errors never leave the gateway: they are logged and
//! turned into "nothing saved" / "nothing loaded". Configuration errors are
//! returned to the binary at startup.

use satchel_core::{CartKind, CoreError};
use thiserror::Error;

/// Result type alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

#[derive(Debug, Error)]
pub enum PersistError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid storage configuration.
    #[error("Invalid storage configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// The key-value store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Envelope Errors
    // =========================================================================
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Envelope written by a newer (or unknown) format.
    #[error("Unsupported envelope version: {0}")]
    UnsupportedVersion(u32),

    /// Envelope belongs to the other cart engine.
    #[error("Envelope is for the {found} cart, expected {expected}")]
    KindMismatch { expected: CartKind, found: CartKind },

    /// Envelope decoded, but its lines break a cart rule.
    #[error("Saved cart is invalid: {0}")]
    InvalidCart(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<satchel_db::DbError> for PersistError {
    fn from(err: satchel_db::DbError) -> Self {
        PersistError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            PersistError::DeserializationFailed(err.to_string())
        } else {
            PersistError::SerializationFailed(err.to_string())
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> Self {
        PersistError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for PersistError {
    fn from(err: toml::de::Error) -> Self {
        PersistError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for PersistError {
    fn from(err: toml::ser::Error) -> Self {
        PersistError::ConfigSaveFailed(err.to_string())
    }
}

impl PersistError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PersistError::InvalidConfig(_)
                | PersistError::ConfigLoadFailed(_)
                | PersistError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_syntax_error_is_deserialization() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(
            PersistError::from(err),
            PersistError::DeserializationFailed(_)
        ));
    }

    #[test]
    fn test_config_error_category() {
        assert!(PersistError::InvalidConfig("x".into()).is_config_error());
        assert!(!PersistError::Storage("x".into()).is_config_error());
        assert!(!PersistError::UnsupportedVersion(9).is_config_error());
    }

    #[test]
    fn test_kind_mismatch_display() {
        let err = PersistError::KindMismatch {
            expected: CartKind::Marketplace,
            found: CartKind::FoodOrder,
        };
        assert_eq!(
            err.to_string(),
            "Envelope is for the food cart, expected marketplace"
        );
    }
}
