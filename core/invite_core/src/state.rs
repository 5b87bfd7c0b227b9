//! Per-page application state and the locale it is displayed in.

use serde::{Deserialize, Serialize};

/// Slug used when the incoming link names no event.
pub const DEFAULT_EVENT_SLUG: &str = "uvx-mar-2026";

/// One of the two supported display languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Jp,
}

impl Locale {
    /// Parse a `lang` query value. Anything but a case-insensitive `jp` is English.
    pub fn from_param(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("jp") {
            Self::Jp
        } else {
            Self::En
        }
    }

    /// Key used both in the `lang` query parameter and in localized config maps.
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Jp => "jp",
        }
    }

    /// Value for the `<html lang>` attribute.
    pub fn html_lang(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Jp => "ja",
        }
    }
}

/// Everything the page shows that is not part of the event configuration.
///
/// Built by [`crate::resolver::resolve`] and afterwards mutated only through the
/// setters below, which the [`crate::controller::Controller`] calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationState {
    event_slug: String,
    pub locale: Locale,
    pub guest_name: String,
    pub sender_name: String,
    pub referral_code: String,
    pub selected_tier_id: String,
    pub music_enabled: bool,
}

impl ApplicationState {
    pub fn new(event_slug: impl Into<String>) -> Self {
        Self {
            event_slug: event_slug.into(),
            locale: Locale::En,
            guest_name: String::new(),
            sender_name: String::new(),
            referral_code: String::new(),
            selected_tier_id: String::new(),
            music_enabled: false,
        }
    }

    pub fn event_slug(&self) -> &str {
        &self.event_slug
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    pub fn set_guest_name(&mut self, name: impl Into<String>) {
        self.guest_name = name.into();
    }

    pub fn set_sender_name(&mut self, name: impl Into<String>) {
        self.sender_name = name.into();
    }

    pub fn set_selected_tier(&mut self, tier_id: impl Into<String>) {
        self.selected_tier_id = tier_id.into();
    }

    pub fn clear_selected_tier(&mut self) {
        self.selected_tier_id.clear();
    }

    pub fn set_music_enabled(&mut self, enabled: bool) {
        self.music_enabled = enabled;
    }
}
