//! # Storage Configuration
//!
//! Where and how the cart is persisted.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SATCHEL_DB_PATH=/data/satchel.db                                   │
//! │     SATCHEL_DEBOUNCE_MS=100                                            │
//! │     SATCHEL_NAMESPACE=shop-42                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/satchel/persist.toml (Linux)                             │
//! │     ~/Library/Application Support/com.satchel.satchel/persist.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     platform data dir, 250 ms debounce, namespace "satchel"            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # persist.toml
//! [storage]
//! database_path = "/var/lib/satchel/satchel.db"
//! debounce_ms = 250
//! namespace = "satchel"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use satchel_core::CartKind;

use crate::error::{PersistError, PersistResult};

/// Longest accepted debounce window.
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

const DATABASE_FILE: &str = "satchel.db";

// =============================================================================
// Storage Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file. `None` means the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// How long the writer waits after a change before writing (ms).
    /// Saves arriving inside the window collapse into one write.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Prefix of every storage key.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_debounce_ms() -> u64 {
    250
}

fn default_namespace() -> String {
    "satchel".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            database_path: None,
            debounce_ms: default_debounce_ms(),
            namespace: default_namespace(),
        }
    }
}

// =============================================================================
// Main Persistence Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistConfig {
    #[serde(default)]
    pub storage: StorageSettings,
}

impl PersistConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (persist.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> PersistResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading persistence config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load persistence config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> PersistResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| PersistError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Persistence config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> PersistResult<()> {
        let namespace = &self.storage.namespace;
        if namespace.trim().is_empty() {
            return Err(PersistError::InvalidConfig("namespace must not be empty".into()));
        }
        if namespace.contains(char::is_whitespace) {
            return Err(PersistError::InvalidConfig(format!(
                "namespace must not contain whitespace, got: '{}'",
                namespace
            )));
        }

        if self.storage.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(PersistError::InvalidConfig(format!(
                "debounce_ms must be at most {}, got: {}",
                MAX_DEBOUNCE_MS, self.storage.debounce_ms
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies `SATCHEL_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("SATCHEL_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(ms) = lookup("SATCHEL_DEBOUNCE_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => self.storage.debounce_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring non-numeric SATCHEL_DEBOUNCE_MS"),
            }
        }

        if let Some(namespace) = lookup("SATCHEL_NAMESPACE") {
            self.storage.namespace = namespace;
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "satchel", "satchel")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("persist.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Resolved database file: the configured path, or `satchel.db` in the
    /// platform data directory.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.storage
            .database_path
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join(DATABASE_FILE)))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.storage.debounce_ms)
    }

    /// Storage key of one cart engine: `"{namespace}:cart:{kind}"`.
    pub fn storage_key(&self, kind: CartKind) -> String {
        format!("{}:cart:{}", self.storage.namespace, kind.as_str())
    }
}
