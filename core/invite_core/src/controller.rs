//! Interaction controller: actions in, state mutations and re-renders out.
//!
//! The controller owns the single [`ApplicationState`] of a page load. Each
//! [`Action`] applies one minimal mutation, is tracked, and produces an
//! [`Update`] carrying whatever the view adapter has to apply: new markup,
//! a transient notice, the current share link.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config_doc::ConfigDocument;
use crate::i18n::{ui, UiText};
use crate::playback::{AudioTransport, PlaybackError, PlaybackMachine, PlaybackState};
use crate::render::{render_page, RenderContext};
use crate::share::{build_share_link, ShareError};
use crate::state::{ApplicationState, Locale};
use crate::tracking::{EventLog, NullSink, TrackingSink};

/// How long a notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_millis(1200);

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard access denied")]
    Denied,

    #[error("clipboard unavailable")]
    Unavailable,
}

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Blocking prompt used to hand the link to the user when the clipboard fails.
pub trait ManualCopyPrompt {
    fn prompt(&mut self, message: &str, text: &str);
}

struct NoClipboard;

impl Clipboard for NoClipboard {
    fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

struct NoPrompt;

impl ManualCopyPrompt for NoPrompt {
    fn prompt(&mut self, _message: &str, _text: &str) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SetLocale { locale: Locale },
    SetGuestName { value: String },
    SetSenderName { value: String },
    SelectTier { id: String },
    CopyLink,
    ToggleMusic { enabled: bool },
    TogglePlayback,
}

impl Action {
    /// Name under which the action is tracked.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::SetLocale { .. } => "lang_switch",
            Self::SetGuestName { .. } => "guest_name",
            Self::SetSenderName { .. } => "sender_name",
            Self::SelectTier { .. } => "tier_select",
            Self::CopyLink => "copy_link",
            Self::ToggleMusic { .. } => "music_toggle",
            Self::TogglePlayback => "music_play",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    LinkCopied,
    CopyManually,
    PlaybackBlocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    #[serde(rename = "ttl_ms", serialize_with = "ttl_millis")]
    pub ttl: Duration,
}

impl Notice {
    fn new(kind: NoticeKind, key: UiText, locale: Locale) -> Self {
        Self {
            kind,
            text: ui(key, locale).to_string(),
            ttl: NOTICE_TTL,
        }
    }
}

fn ttl_millis<S: serde::Serializer>(ttl: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(ttl.as_millis() as u64)
}

/// What the view adapter must apply after an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Update {
    pub markup: Option<String>,
    pub notice: Option<Notice>,
    pub share_link: Option<String>,
    pub playback: Option<PlaybackState>,
}

pub struct Controller {
    config: ConfigDocument,
    state: ApplicationState,
    ctx: RenderContext,
    page_url: String,
    clipboard: Box<dyn Clipboard>,
    prompt: Box<dyn ManualCopyPrompt>,
    playback: Option<PlaybackMachine<Box<dyn AudioTransport>>>,
    log: EventLog<Box<dyn TrackingSink>>,
}

impl Controller {
    /// Take ownership of a resolved state once the config is known.
    ///
    /// A selected tier that the config does not list is cleared. `page_url`
    /// must be absolute; it is the base of every share link.
    pub fn new(
        config: ConfigDocument,
        mut state: ApplicationState,
        ctx: RenderContext,
        page_url: impl Into<String>,
    ) -> Result<Self, ShareError> {
        let page_url = page_url.into();
        build_share_link(&page_url, &state)?;

        if !state.selected_tier_id.is_empty() && config.tier(&state.selected_tier_id).is_none() {
            debug!("Dropping unknown tier {:?}", state.selected_tier_id);
            state.clear_selected_tier();
        }

        Ok(Self {
            config,
            state,
            ctx,
            page_url,
            clipboard: Box::new(NoClipboard),
            prompt: Box::new(NoPrompt),
            playback: None,
            log: EventLog::new(Box::new(NullSink) as Box<dyn TrackingSink>),
        })
    }

    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    pub fn with_prompt(mut self, prompt: impl ManualCopyPrompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    /// Music controls are only wired when the config names a music asset.
    pub fn with_audio(mut self, transport: impl AudioTransport + 'static) -> Self {
        if self.config.music_asset().is_some() {
            let transport: Box<dyn AudioTransport> = Box::new(transport);
            self.playback = Some(PlaybackMachine::new(transport));
        }
        self
    }

    /// Resume the machine built by [`with_audio`](Self::with_audio) in
    /// `state`. No-op when music is not wired.
    pub fn with_playback_state(mut self, state: PlaybackState) -> Self {
        if let Some(machine) = self.playback.take() {
            self.playback = Some(PlaybackMachine::with_state(machine.into_transport(), state));
        }
        self
    }

    pub fn with_tracking(mut self, sink: impl TrackingSink + 'static) -> Self {
        let sink: Box<dyn TrackingSink> = Box::new(sink);
        self.log = EventLog::new(sink);
        self
    }

    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    pub fn config(&self) -> &ConfigDocument {
        &self.config
    }

    pub fn playback_state(&self) -> Option<PlaybackState> {
        self.playback.as_ref().map(PlaybackMachine::state)
    }

    pub fn render(&self) -> String {
        render_page(&self.config, &self.state, &self.ctx)
    }

    pub fn share_link(&self) -> Option<String> {
        match build_share_link(&self.page_url, &self.state) {
            Ok(link) => Some(link),
            Err(e) => {
                warn!("Share link unavailable: {e}");
                None
            }
        }
    }

    /// Record a page view without changing anything.
    pub fn track_view(&mut self) {
        self.log.track("page_view", &self.state);
    }

    pub fn dispatch(&mut self, action: Action) -> Update {
        let name = action.event_name();
        let update = match action {
            Action::SetLocale { locale } => {
                self.state.set_locale(locale);
                self.rerender()
            }
            Action::SetGuestName { value } => {
                self.state.set_guest_name(value);
                self.rerender()
            }
            Action::SetSenderName { value } => {
                self.state.set_sender_name(value);
                self.rerender()
            }
            Action::SelectTier { id } => {
                if self.config.tier(&id).is_some() {
                    self.state.set_selected_tier(id);
                } else {
                    self.state.clear_selected_tier();
                }
                Update {
                    share_link: self.share_link(),
                    ..Update::default()
                }
            }
            Action::CopyLink => self.copy_link(),
            Action::ToggleMusic { enabled } => self.toggle_music(enabled),
            Action::TogglePlayback => self.toggle_playback(),
        };
        self.log.track(name, &self.state);
        update
    }

    fn rerender(&self) -> Update {
        Update {
            markup: Some(self.render()),
            share_link: self.share_link(),
            ..Update::default()
        }
    }

    fn copy_link(&mut self) -> Update {
        let Some(link) = self.share_link() else {
            return Update::default();
        };
        let locale = self.state.locale;
        let notice = match self.clipboard.write_text(&link) {
            Ok(()) => Notice::new(NoticeKind::LinkCopied, UiText::LinkCopied, locale),
            Err(e) => {
                debug!("Clipboard write failed, prompting: {e}");
                self.prompt.prompt(ui(UiText::CopyManually, locale), &link);
                Notice::new(NoticeKind::CopyManually, UiText::CopyManually, locale)
            }
        };
        Update {
            notice: Some(notice),
            share_link: Some(link),
            ..Update::default()
        }
    }

    fn toggle_music(&mut self, enabled: bool) -> Update {
        let Some(machine) = self.playback.as_mut() else {
            return Update::default();
        };
        self.state.set_music_enabled(enabled);
        let result = if enabled {
            machine.play()
        } else {
            Ok(machine.stop())
        };
        let mut update = self.rerender();
        self.apply_playback_result(result, &mut update);
        update
    }

    fn toggle_playback(&mut self) -> Update {
        let Some(machine) = self.playback.as_mut() else {
            return Update::default();
        };
        let result = machine.toggle();
        let mut update = Update::default();
        self.apply_playback_result(result, &mut update);
        update
    }

    fn apply_playback_result(
        &self,
        result: Result<PlaybackState, PlaybackError>,
        update: &mut Update,
    ) {
        if let Err(e) = result {
            debug!("Playback did not start: {e}");
            update.notice = Some(Notice::new(
                NoticeKind::PlaybackBlocked,
                UiText::PlaybackBlocked,
                self.state.locale,
            ));
        }
        update.playback = self.playback_state();
    }
}
