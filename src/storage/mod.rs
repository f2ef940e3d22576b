//! Storage Module
//!
//! This module provides the key-value store and the handle used to reach it
//! from concurrent workers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SharedStore                            │
//! │            (Arc, cloned into every worker)                  │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                    Mutex<Store>                       │  │
//! │  │   insert / lookup / remove / list_keys -> Outcome     │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use duokv::storage::{InsertOutcome, RemoveOutcome, SharedStore};
//!
//! let store = SharedStore::new();
//! assert_eq!(store.insert("name", "Ariz"), InsertOutcome::Success);
//! assert_eq!(store.remove("name"), RemoveOutcome::Removed);
//! assert!(store.is_empty());
//! ```

pub mod shared;
pub mod store;

// Re-export commonly used types
pub use shared::SharedStore;
pub use store::{
    has_valid_key_chars, InsertOutcome, KeysOutcome, LookupOutcome, RemoveOutcome, Store,
    KEY_SEPARATOR, MAX_KEY_LEN, MAX_VALUE_LEN,
};
