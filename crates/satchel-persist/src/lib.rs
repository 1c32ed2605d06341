//! # satchel-persist: Write-Behind Persistence for Satchel
//!
//! The in-memory cart is the truth. This crate keeps a copy of it in a
//! key-value store so the cart survives a restart, and does so without ever
//! blocking, failing, or reordering anything the cart does.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  start(store, kind, config) ──► spawns writer task                      │
//! │       │                                                                 │
//! │       ├── load_once().await        (exactly one read per gateway)       │
//! │       │                                                                 │
//! │       ├── save(snapshot)  ─┐                                            │
//! │       ├── save(snapshot)  ─┼─► latest wins ─► debounce ─► kv.set(json)  │
//! │       ├── save(snapshot)  ─┘                                            │
//! │       │                                                                 │
//! │       ├── flush().await            (write pending now)                  │
//! │       └── shutdown().await         (flush + stop task)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`gateway`] - `PersistenceGateway` and its writer task
//! - [`envelope`] - The persisted JSON document
//! - [`config`] - Storage configuration (TOML + environment)
//! - [`error`] - Persistence error types

pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;

pub use config::{PersistConfig, StorageSettings};
pub use envelope::{PersistedCart, ENVELOPE_VERSION};
pub use error::{PersistError, PersistResult};
pub use gateway::PersistenceGateway;
