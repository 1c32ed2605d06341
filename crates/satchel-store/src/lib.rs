//! # satchel-store: Live Cart State for Satchel
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Screens (cart badge, cart screen, product page, checkout bar)          │
//! │       │ commands / queries               ▲ re-render                    │
//! │       ▼                                  │                              │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                satchel-store (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   CartFacade ──► CartStore ──► Broadcaster ──► listeners        │   │
//! │  │       │           (Arc swap)    (Subscription guards)           │   │
//! │  │       └──► PersistenceGateway::save  (satchel-persist)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`facade`] - `CartFacade`, the API screens call
//! - [`store`] - `CartStore`, the single live snapshot
//! - [`broadcaster`] - Listener registry and `Subscription` handles
//!
//! ## Example
//! ```rust,ignore
//! use satchel_core::{CartKind, LineModifiers};
//! use satchel_db::MemoryStore;
//! use satchel_persist::PersistConfig;
//! use satchel_store::CartFacade;
//!
//! let cart = CartFacade::new(MemoryStore::new(), CartKind::Marketplace, &PersistConfig::default());
//! cart.hydrate().await;
//!
//! let _badge = cart.subscribe(|snap| println!("{} lines", snap.len()));
//! cart.add_item(&product, 2, LineModifiers::none());
//! ```

pub mod broadcaster;
pub mod facade;
pub mod store;

pub use broadcaster::{Broadcaster, Listener, Subscription};
pub use facade::CartFacade;
pub use store::CartStore;
