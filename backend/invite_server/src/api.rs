//! Axum handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use invite_core::controller::Notice;
use invite_core::playback::PlaybackState;
use invite_core::share::{build_share_link, share_query};
use invite_core::Action;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::error;

use crate::config::Config;
use crate::db::{self, TrackingRow};
use crate::fetch;
use crate::page::{self, ClientReport};
use crate::tracker::ChannelSink;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
    pub client: Client,
    pub config: Config,
    pub sink: ChannelSink,
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ActionRequest {
    /// Query string of the page the action happened on.
    #[serde(default)]
    pub query: String,
    pub action: Action,
    #[serde(flatten)]
    pub report: ClientReport,
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub markup: Option<String>,
    pub notice: Option<Notice>,
    pub share_link: Option<String>,
    pub playback: Option<PlaybackState>,
    /// Query describing the state after the action.
    pub query: Option<String>,
}

#[derive(Serialize)]
pub struct ShareResponse {
    pub share_link: String,
}

#[derive(Deserialize)]
pub struct TrackingParams {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct TrackingResponse {
    pub count: usize,
    pub events: Vec<TrackingRow>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Error panel to show instead of the view, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
}

fn json_error(status: StatusCode, error: String, markup: Option<String>) -> Response {
    (status, Json(ErrorResponse { error, markup })).into_response()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /`
///
/// Renders the invitation for the query, or the error panel (502) when the
/// event config cannot be loaded.
pub async fn index(
    State(api): State<Arc<ApiState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let query = query.unwrap_or_default();
    let visitor = page::identify(&api, &headers).await;
    let state = page::resolve_request(&api, visitor.as_ref(), &query).await;

    let config =
        match fetch::fetch_config(&api.client, &api.config.config_base_url, state.event_slug())
            .await
        {
            Ok(config) => config,
            Err(e) => {
                let panel = page::error_panel(&e, &state, &api.config.config_base_url);
                let response = (StatusCode::BAD_GATEWAY, Html(panel)).into_response();
                return page::with_visitor_cookie(visitor.as_ref(), response);
            }
        };

    let response = match page::render_view(&api, config, state, &query) {
        Ok(markup) => Html(markup).into_response(),
        Err(e) => {
            error!("Page render failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    };
    page::with_visitor_cookie(visitor.as_ref(), response)
}

/// `GET /share`
///
/// Share link for the state the query describes.
pub async fn share(
    State(api): State<Arc<ApiState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let query = query.unwrap_or_default();
    let visitor = page::identify(&api, &headers).await;
    let state = page::resolve_request(&api, visitor.as_ref(), &query).await;
    let url = page::page_url(&api.config.public_url, &query);

    let response = match build_share_link(&url, &state) {
        Ok(share_link) => (StatusCode::OK, Json(ShareResponse { share_link })).into_response(),
        Err(e) => {
            error!("Share link failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None)
        }
    };
    page::with_visitor_cookie(visitor.as_ref(), response)
}

/// `POST /actions`
///
/// Applies one interaction to the page state and returns what changed.
pub async fn actions(
    State(api): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(req): Json<ActionRequest>,
) -> Response {
    let visitor = page::identify(&api, &headers).await;
    let state = page::resolve_request(&api, visitor.as_ref(), &req.query).await;

    let config =
        match fetch::fetch_config(&api.client, &api.config.config_base_url, state.event_slug())
            .await
        {
            Ok(config) => config,
            Err(e) => {
                let panel = page::error_panel(&e, &state, &api.config.config_base_url);
                let response = json_error(StatusCode::BAD_GATEWAY, e.to_string(), Some(panel));
                return page::with_visitor_cookie(visitor.as_ref(), response);
            }
        };

    let response = match page::apply_action(&api, config, state, &req.query, req.action, req.report)
    {
        Ok(update) => {
            let query = update.share_link.as_deref().and_then(share_query);
            (
                StatusCode::OK,
                Json(ActionResponse {
                    markup: update.markup,
                    notice: update.notice,
                    share_link: update.share_link,
                    playback: update.playback,
                    query,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Action failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None)
        }
    };
    page::with_visitor_cookie(visitor.as_ref(), response)
}

/// `GET /tracking`
///
/// Most recent tracking records, oldest first.
pub async fn tracking(
    State(api): State<Arc<ApiState>>,
    Query(params): Query<TrackingParams>,
) -> Response {
    let limit = params
        .limit
        .unwrap_or(api.config.tracking_cap as i64)
        .clamp(1, api.config.tracking_cap.max(1) as i64);

    match db::recent_tracking(&api.pool, limit).await {
        Ok(events) => {
            let count = events.len();
            (StatusCode::OK, Json(TrackingResponse { count, events })).into_response()
        }
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
    }
}
