//! # Storage
//!
//! Best-effort key/value persistence shared by every handler on the page.
//!
//! | Key             | Value                                   |
//! |-----------------|-----------------------------------------|
//! | `invite.ref`    | Last seen referral code (plain string)  |
//! | `invite.track`  | JSON list of [`crate::tracking::TrackRecord`], capped |
//!
//! Callers treat every [`StorageError`] as recoverable: referral persistence
//! and tracking are conveniences, so a failing store never changes what the
//! page renders.

use std::collections::BTreeMap;

use thiserror::Error;

/// Last referral code seen in an incoming link.
pub const REFERRAL_KEY: &str = "invite.ref";
/// Capped list of tracking records.
pub const TRACKING_KEY: &str = "invite.track";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded for key {0}")]
    QuotaExceeded(String),
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store that remembers which keys were written.
///
/// The server seeds one per request from SQLite and writes the dirty keys back
/// once the core is done with it.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    dirty: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without marking it dirty.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Keys written since construction, with their current values.
    pub fn dirty_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dirty.iter().filter_map(|k| {
            self.entries
                .get_key_value(k)
                .map(|(k, v)| (k.as_str(), v.as_str()))
        })
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        if !self.dirty.iter().any(|k| k == key) {
            self.dirty.push(key.to_string());
        }
        Ok(())
    }
}
