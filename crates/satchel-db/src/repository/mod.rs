//! # Repository Module
//!
//! Table-level access for the Satchel database.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PersistenceGateway                                                    │
//! │       │                                                                 │
//! │       │  db.kv().set("satchel:cart:food", json)                         │
//! │       ▼                                                                 │
//! │  KvRepository                                                          │
//! │  ├── get(&self, key)                                                   │
//! │  ├── set(&self, key, value)    (upsert)                                │
//! │  └── delete(&self, key)                                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database (kv_store)                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod kv;
