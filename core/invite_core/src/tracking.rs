//! Fire-and-forget click tracking into a bounded log.
//!
//! [`EventLog`] stamps each record and hands it to a [`TrackingSink`]. Sinks
//! keep at most their capacity, evicting the oldest records first, and never
//! report failure back to the UI action that produced the record.
//!
//! Two sinks ship with the core: [`LocalStorageSink`] for hosts that own a
//! [`KeyValueStore`] (the browser's local storage, an embedded store) and
//! [`NullSink`]. Hosts with their own persistence implement [`TrackingSink`]
//! directly; the HTTP server feeds SQLite through a channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::ApplicationState;
use crate::storage::{KeyValueStore, TRACKING_KEY};

/// Most recent records kept by default.
pub const TRACKING_CAP: usize = 400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub name: String,
    pub ts: DateTime<Utc>,
    pub state: ApplicationState,
}

pub trait TrackingSink {
    fn append(&mut self, record: TrackRecord);
}

impl<T: TrackingSink + ?Sized> TrackingSink for Box<T> {
    fn append(&mut self, record: TrackRecord) {
        (**self).append(record)
    }
}

/// Append `record`, then drop from the front until `records.len() <= cap`.
pub fn push_capped(records: &mut Vec<TrackRecord>, record: TrackRecord, cap: usize) {
    records.push(record);
    if records.len() > cap {
        let excess = records.len() - cap;
        records.drain(..excess);
    }
}

pub struct EventLog<S> {
    sink: S,
}

impl<S: TrackingSink> EventLog<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn track(&mut self, name: &str, state: &ApplicationState) {
        self.sink.append(TrackRecord {
            name: name.to_string(),
            ts: Utc::now(),
            state: state.clone(),
        });
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// Stores the log as a JSON list under [`TRACKING_KEY`], capped at `cap`
/// records. Use it with any [`KeyValueStore`] the host provides.
pub struct LocalStorageSink<K> {
    store: K,
    cap: usize,
}

impl<K: KeyValueStore> LocalStorageSink<K> {
    pub fn new(store: K, cap: usize) -> Self {
        Self { store, cap }
    }

    /// Records currently persisted; unreadable or corrupt logs read as empty.
    pub fn records(&self) -> Vec<TrackRecord> {
        match self.store.get(TRACKING_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!("Tracking log unreadable: {e}");
                Vec::new()
            }
        }
    }
}

impl<K: KeyValueStore> TrackingSink for LocalStorageSink<K> {
    fn append(&mut self, record: TrackRecord) {
        let mut records = self.records();
        push_capped(&mut records, record, self.cap);
        let encoded = match serde_json::to_string(&records) {
            Ok(s) => s,
            Err(e) => {
                debug!("Tracking record not encodable: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(TRACKING_KEY, &encoded) {
            debug!("Tracking record dropped: {e}");
        }
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TrackingSink for NullSink {
    fn append(&mut self, _record: TrackRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};

    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded(key.to_string()))
        }
    }

    #[test]
    fn evicts_oldest_beyond_cap() {
        let state = ApplicationState::new("demo");
        let mut log = EventLog::new(LocalStorageSink::new(MemoryStore::new(), 3));
        for i in 0..5 {
            log.track(&format!("click_{i}"), &state);
        }
        let names: Vec<String> = log.sink().records().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["click_2", "click_3", "click_4"]);
    }

    #[test]
    fn records_carry_state_snapshot() {
        let mut state = ApplicationState::new("demo");
        state.set_selected_tier("vip");
        let mut log = EventLog::new(LocalStorageSink::new(MemoryStore::new(), TRACKING_CAP));
        log.track("tier_select", &state);
        let records = log.sink().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state.selected_tier_id, "vip");
    }

    #[test]
    fn corrupt_log_is_replaced() {
        let store = MemoryStore::new().with_entry(TRACKING_KEY, "not json");
        let mut log = EventLog::new(LocalStorageSink::new(store, TRACKING_CAP));
        log.track("open", &ApplicationState::new("demo"));
        assert_eq!(log.sink().records().len(), 1);
    }

    #[test]
    fn full_storage_is_silent() {
        let mut log = EventLog::new(LocalStorageSink::new(FullStore, TRACKING_CAP));
        log.track("open", &ApplicationState::new("demo"));
        assert!(log.sink().records().is_empty());
    }
}
