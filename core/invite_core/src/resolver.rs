//! Query string → [`ApplicationState`].

use tracing::debug;

use crate::state::{ApplicationState, Locale, DEFAULT_EVENT_SLUG};
use crate::storage::{KeyValueStore, REFERRAL_KEY};

pub const PARAM_EVENT: &str = "event";
pub const PARAM_LANG: &str = "lang";
pub const PARAM_NAME: &str = "name";
pub const PARAM_TO: &str = "to";
pub const PARAM_FROM: &str = "from";
pub const PARAM_REF: &str = "ref";
pub const PARAM_TIER: &str = "tier";
pub const PARAM_MUSIC: &str = "music";

/// Decoded query parameters, first occurrence wins.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse a raw query. A leading `?` is accepted.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`get`](Self::get) but treats an empty value as absent.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }
}

/// Build the state for a page load.
///
/// A `ref` in the query wins over the persisted one and is persisted in turn.
/// Storage failures are swallowed: the state resolves either way.
pub fn resolve<S: KeyValueStore>(query: &str, store: &mut S) -> ApplicationState {
    let params = QueryParams::parse(query);

    let mut state =
        ApplicationState::new(params.non_empty(PARAM_EVENT).unwrap_or(DEFAULT_EVENT_SLUG));
    state.locale = params
        .get(PARAM_LANG)
        .map(Locale::from_param)
        .unwrap_or_default();
    state.guest_name = params
        .non_empty(PARAM_NAME)
        .or_else(|| params.non_empty(PARAM_TO))
        .unwrap_or_default()
        .to_string();
    state.sender_name = params.non_empty(PARAM_FROM).unwrap_or_default().to_string();
    state.selected_tier_id = params.non_empty(PARAM_TIER).unwrap_or_default().to_string();
    state.music_enabled = params.get(PARAM_MUSIC) == Some("1");
    state.referral_code = resolve_referral(params.non_empty(PARAM_REF), store);

    state
}

fn resolve_referral<S: KeyValueStore>(incoming: Option<&str>, store: &mut S) -> String {
    if let Some(code) = incoming {
        if let Err(e) = store.set(REFERRAL_KEY, code) {
            debug!("Referral not persisted: {e}");
        }
        return code.to_string();
    }

    match store.get(REFERRAL_KEY) {
        Ok(Some(saved)) => saved,
        Ok(None) => String::new(),
        Err(e) => {
            debug!("Persisted referral unreadable: {e}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disabled".into()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".into()))
        }
    }

    #[test]
    fn empty_query_yields_defaults() {
        let state = resolve("", &mut MemoryStore::new());
        assert_eq!(state.event_slug(), DEFAULT_EVENT_SLUG);
        assert_eq!(state.locale, Locale::En);
        assert!(state.guest_name.is_empty());
        assert!(state.sender_name.is_empty());
        assert!(state.referral_code.is_empty());
        assert!(state.selected_tier_id.is_empty());
        assert!(!state.music_enabled);
    }

    #[test]
    fn reads_every_parameter() {
        let state = resolve(
            "?event=demo&lang=JP&name=Aki%20Tanaka&from=Ken&ref=R1&tier=vip&music=1",
            &mut MemoryStore::new(),
        );
        assert_eq!(state.event_slug(), "demo");
        assert_eq!(state.locale, Locale::Jp);
        assert_eq!(state.guest_name, "Aki Tanaka");
        assert_eq!(state.sender_name, "Ken");
        assert_eq!(state.referral_code, "R1");
        assert_eq!(state.selected_tier_id, "vip");
        assert!(state.music_enabled);
    }

    #[test]
    fn to_is_an_alias_for_name() {
        let state = resolve("to=Mika", &mut MemoryStore::new());
        assert_eq!(state.guest_name, "Mika");

        let state = resolve("name=Aki&to=Mika", &mut MemoryStore::new());
        assert_eq!(state.guest_name, "Aki");
    }

    #[test]
    fn music_requires_literal_one() {
        assert!(!resolve("music=true", &mut MemoryStore::new()).music_enabled);
        assert!(!resolve("music=0", &mut MemoryStore::new()).music_enabled);
    }

    #[test]
    fn incoming_referral_overrides_and_persists() {
        let mut store = MemoryStore::new().with_entry(REFERRAL_KEY, "OLD");
        let state = resolve("ref=NEW", &mut store);
        assert_eq!(state.referral_code, "NEW");
        assert_eq!(store.get(REFERRAL_KEY).unwrap().as_deref(), Some("NEW"));
    }

    #[test]
    fn persisted_referral_is_used_when_link_has_none() {
        let mut store = MemoryStore::new().with_entry(REFERRAL_KEY, "SAVED");
        let state = resolve("event=demo", &mut store);
        assert_eq!(state.referral_code, "SAVED");
        assert_eq!(store.dirty_entries().count(), 0);
    }

    #[test]
    fn broken_storage_still_resolves() {
        let state = resolve("ref=ABC", &mut BrokenStore);
        assert_eq!(state.referral_code, "ABC");

        let state = resolve("", &mut BrokenStore);
        assert!(state.referral_code.is_empty());
    }

    #[test]
    fn resolving_twice_is_idempotent() {
        let mut store = MemoryStore::new();
        let first = resolve("event=demo&ref=X&lang=jp", &mut store);
        let second = resolve("event=demo&ref=X&lang=jp", &mut store);
        assert_eq!(first, second);
    }
}
