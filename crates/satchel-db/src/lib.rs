//! # satchel-db: Key-Value Storage for Satchel
//!
//! The cart engine only needs a tiny storage contract: read a string by
//! key, write a string under a key. This crate defines that contract and
//! ships two implementations of it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Satchel Data Flow                                │
//! │                                                                         │
//! │  PersistenceGateway (satchel-persist)                                  │
//! │       │   get(key) / set(key, json)                                     │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  satchel-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────┐   ┌───────────────┐   ┌──────────────┐   │   │
//! │  │   │ KeyValueStore  │   │   Database    │   │ MemoryStore  │   │   │
//! │  │   │   (store.rs)   │◄──│   (pool.rs)   │   │  (store.rs)  │   │   │
//! │  │   │   contract     │   │ + KvRepository│   │  tests/demo  │   │   │
//! │  │   └────────────────┘   └───────────────┘   └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/satchel.db  (table kv_store)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The `KeyValueStore` contract and the in-memory store
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`repository`] - The `kv_store` table repository
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use satchel_db::{Database, DbConfig, KeyValueStore};
//!
//! let db = Database::new(DbConfig::new("path/to/satchel.db")).await?;
//!
//! db.set("satchel:cart:food", "{...}").await?;
//! let json = db.get("satchel:cart:food").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::kv::KvRepository;
pub use store::{KeyValueStore, MemoryStore};
