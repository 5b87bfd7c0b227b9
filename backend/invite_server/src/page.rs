//! Glue between HTTP requests and the invitation core.
//!
//! Everything async (visitor lookup, storage snapshot, config fetch) happens
//! before a [`Controller`] is built; the controller itself lives only inside
//! the synchronous helpers below.

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use invite_core::controller::{Clipboard, ClipboardError};
use invite_core::playback::{AudioTransport, PlaybackError, PlaybackState};
use invite_core::render::{render_error_panel, RenderContext};
use invite_core::share::ShareError;
use invite_core::storage::MemoryStore;
use invite_core::{resolver, Action, ApplicationState, ConfigDocument, Controller, Update};
use serde::Deserialize;
use tracing::debug;

use crate::api::ApiState;
use crate::db;
use crate::errors::ServerError;

/// Cookie carrying the visitor id that scopes persisted storage.
pub const VISITOR_COOKIE: &str = "invite_visitor";
const VISITOR_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

/// What the browser observed while carrying out the previous step. The page
/// owns the clipboard and the `<audio>` element, so it reports their outcome.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ClientReport {
    /// Playback state of the audio element before this action.
    pub playback: Option<PlaybackState>,
    /// The clipboard write was rejected.
    pub clipboard_denied: bool,
    /// The browser refused to start playback.
    pub playback_blocked: bool,
}

struct ReportedClipboard {
    denied: bool,
}

impl Clipboard for ReportedClipboard {
    fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        if self.denied {
            Err(ClipboardError::Denied)
        } else {
            Ok(())
        }
    }
}

struct ReportedAudio {
    blocked: bool,
}

impl AudioTransport for ReportedAudio {
    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.blocked {
            Err(PlaybackError::Blocked)
        } else {
            Ok(())
        }
    }

    fn pause(&mut self) {}

    fn stop(&mut self) {}
}

/// A browser identified by its [`VISITOR_COOKIE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visitor {
    pub id: String,
    /// The id was minted for this request and must be sent back.
    pub issued: bool,
}

impl Visitor {
    fn set_cookie(&self) -> Option<HeaderValue> {
        if !self.issued {
            return None;
        }
        HeaderValue::from_str(&format!(
            "{VISITOR_COOKIE}={}; Path=/; Max-Age={VISITOR_MAX_AGE_SECS}; HttpOnly; SameSite=Lax",
            self.id
        ))
        .ok()
    }
}

fn is_visitor_id(raw: &str) -> bool {
    raw.len() == 32 && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Visitor id from the `Cookie` header, if it carries a well-formed one.
pub fn visitor_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(name, _)| name.trim() == VISITOR_COOKIE)
        .map(|(_, value)| value.trim().to_ascii_lowercase())
        .filter(|value| is_visitor_id(value))
}

/// Known visitor, or a fresh id. `None` when no id could be minted; storage
/// is then skipped for the request.
pub async fn identify(api: &ApiState, headers: &HeaderMap) -> Option<Visitor> {
    if let Some(id) = visitor_cookie(headers) {
        return Some(Visitor { id, issued: false });
    }
    match db::new_visitor_id(&api.pool).await {
        Ok(id) => Some(Visitor { id, issued: true }),
        Err(e) => {
            debug!("Visitor id unavailable: {e}");
            None
        }
    }
}

/// Attach the visitor cookie when it was minted for this request.
pub fn with_visitor_cookie(visitor: Option<&Visitor>, mut response: Response) -> Response {
    if let Some(cookie) = visitor.and_then(Visitor::set_cookie) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

/// Resolve the request's state against the visitor's persisted store and
/// write back any referral it carried.
pub async fn resolve_request(
    api: &ApiState,
    visitor: Option<&Visitor>,
    query: &str,
) -> ApplicationState {
    let Some(visitor) = visitor else {
        return resolver::resolve(query, &mut MemoryStore::new());
    };
    let mut store = db::load_store(&api.pool, &visitor.id).await;
    let state = resolver::resolve(query, &mut store);
    db::flush_store(&api.pool, &visitor.id, &store).await;
    state
}

/// Absolute URL of the page the request was made for.
pub fn page_url(public_url: &str, query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    if query.is_empty() {
        public_url.to_string()
    } else {
        format!("{public_url}?{query}")
    }
}

fn controller(
    api: &ApiState,
    config: ConfigDocument,
    state: ApplicationState,
    query: &str,
    report: ClientReport,
) -> Result<Controller, ShareError> {
    Ok(Controller::new(
        config,
        state,
        RenderContext::new(api.config.asset_base_url.clone()),
        page_url(&api.config.public_url, query),
    )?
    .with_clipboard(ReportedClipboard {
        denied: report.clipboard_denied,
    })
    .with_audio(ReportedAudio {
        blocked: report.playback_blocked,
    })
    .with_playback_state(report.playback.unwrap_or_default())
    .with_tracking(api.sink.clone()))
}

/// Full page markup for an initial load. Tracks a page view.
pub fn render_view(
    api: &ApiState,
    config: ConfigDocument,
    state: ApplicationState,
    query: &str,
) -> Result<String, ShareError> {
    let mut ctl = controller(api, config, state, query, ClientReport::default())?;
    ctl.track_view();
    Ok(ctl.render())
}

/// Apply one action to the state the query describes.
pub fn apply_action(
    api: &ApiState,
    config: ConfigDocument,
    state: ApplicationState,
    query: &str,
    action: Action,
    report: ClientReport,
) -> Result<Update, ShareError> {
    let mut ctl = controller(api, config, state, query, report)?;
    Ok(ctl.dispatch(action))
}

/// Error panel markup for a failed config load.
pub fn error_panel(err: &ServerError, state: &ApplicationState, config_base: &str) -> String {
    match err {
        ServerError::ConfigUnavailable { path, message } => {
            render_error_panel(message, path, state.locale)
        }
        other => render_error_panel(
            &other.to_string(),
            &invite_core::paths::config_path(config_base, state.event_slug()),
            state.locale,
        ),
    }
}
