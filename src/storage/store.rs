//! Key-Value Store
//!
//! This module implements the mapping that every session reads and mutates.
//! Operations never fail with an error: each one returns an outcome enum that
//! names exactly which rule the request ran into, and the command layer turns
//! that outcome into response text.
//!
//! ## Rules
//!
//! - Keys are ASCII letters and digits only, 1 to 10 characters.
//! - Values are 1 to 10 characters, checked on insertion only.
//! - Entries are immutable: a PUT on an existing key is rejected, so an update
//!   is a DELETE followed by a PUT.
//!
//! Insert checks run in a fixed order: key characters, then uniqueness, then
//! lengths. A key that is both too long and already present reports
//! `DuplicateKey`.

use std::collections::HashMap;

/// Maximum key length in characters.
pub const MAX_KEY_LEN: usize = 10;

/// Maximum value length in characters.
pub const MAX_VALUE_LEN: usize = 10;

/// Separator placed between keys in a KEYS listing.
pub const KEY_SEPARATOR: char = ':';

/// Result of [`Store::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The entry was stored.
    Success,
    /// The key is empty or contains something other than ASCII letters and digits.
    InvalidKeyChars,
    /// The key is already present; the stored value is untouched.
    DuplicateKey,
    /// The key is longer than 10 characters, or the value is empty or longer than 10.
    LengthExceeded,
}

/// Result of [`Store::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(String),
    NotFound,
}

/// Result of [`Store::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// Result of [`Store::list_keys`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeysOutcome {
    Empty,
    /// Every stored key exactly once, in the store's iteration order.
    NonEmpty(Vec<String>),
}

impl KeysOutcome {
    /// Joins the keys with `:` and no trailing separator.
    ///
    /// Returns an empty string for [`KeysOutcome::Empty`].
    pub fn joined(&self) -> String {
        match self {
            KeysOutcome::Empty => String::new(),
            KeysOutcome::NonEmpty(keys) => {
                let mut out = String::with_capacity(keys.len() * (MAX_KEY_LEN + 1));
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        out.push(KEY_SEPARATOR);
                    }
                    out.push_str(key);
                }
                out
            }
        }
    }
}

/// Returns true if `key` is non-empty and made only of ASCII letters and digits.
#[inline]
pub fn has_valid_key_chars(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Returns true if both lengths are within the insertion limits.
#[inline]
fn within_length_limits(key: &str, value: &str) -> bool {
    let value_len = value.chars().count();
    key.chars().count() <= MAX_KEY_LEN && (1..=MAX_VALUE_LEN).contains(&value_len)
}

/// An in-memory key-value mapping.
///
/// `Store` itself is not synchronized; it takes `&mut self` for mutations.
/// Concurrent callers go through [`SharedStore`](crate::storage::SharedStore),
/// which puts the whole store behind one lock.
///
/// # Example
///
/// ```
/// use duokv::storage::{InsertOutcome, LookupOutcome, Store};
///
/// let mut store = Store::new();
/// assert_eq!(store.insert("name", "Ariz"), InsertOutcome::Success);
/// assert_eq!(store.lookup("name"), LookupOutcome::Found("Ariz".to_string()));
/// assert_eq!(store.insert("name", "other"), InsertOutcome::DuplicateKey);
/// ```
#[derive(Debug, Default)]
pub struct Store {
    entries: HashMap<String, String>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new entry if the key is valid, absent, and both lengths fit.
    ///
    /// Only [`InsertOutcome::Success`] changes the mapping.
    pub fn insert(&mut self, key: &str, value: &str) -> InsertOutcome {
        if !has_valid_key_chars(key) {
            return InsertOutcome::InvalidKeyChars;
        }

        if self.entries.contains_key(key) {
            return InsertOutcome::DuplicateKey;
        }

        if !within_length_limits(key, value) {
            return InsertOutcome::LengthExceeded;
        }

        self.entries.insert(key.to_string(), value.to_string());
        InsertOutcome::Success
    }

    /// Looks up the value stored under `key`.
    pub fn lookup(&self, key: &str) -> LookupOutcome {
        match self.entries.get(key) {
            Some(value) => LookupOutcome::Found(value.clone()),
            None => LookupOutcome::NotFound,
        }
    }

    /// Removes the entry stored under `key`.
    pub fn remove(&mut self, key: &str) -> RemoveOutcome {
        match self.entries.remove(key) {
            Some(_) => RemoveOutcome::Removed,
            None => RemoveOutcome::NotFound,
        }
    }

    /// Lists every stored key.
    pub fn list_keys(&self) -> KeysOutcome {
        if self.entries.is_empty() {
            return KeysOutcome::Empty;
        }
        KeysOutcome::NonEmpty(self.entries.keys().cloned().collect())
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
