//! One-shot event config fetch.
//!
//! The request bypasses caches (`Cache-Control: no-cache`). Any failure
//! (invalid slug, transport error, non-2xx status, undecodable body) is
//! reported as [`ServerError::ConfigUnavailable`] carrying the literal path
//! that was attempted, so a misconfigured slug can be diagnosed from the
//! error panel alone.

use std::time::Duration;

use invite_core::paths::{config_path, is_valid_slug};
use invite_core::ConfigDocument;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use tracing::{debug, warn};

use crate::errors::{Result, ServerError};

pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Fetch and decode `<base>/events/<slug>/config.json`.
pub async fn fetch_config(client: &Client, base: &str, slug: &str) -> Result<ConfigDocument> {
    let path = config_path(base, slug);
    let unavailable = |message: String| ServerError::ConfigUnavailable {
        path: path.clone(),
        message,
    };

    if !is_valid_slug(slug) {
        warn!("Rejected event slug {slug:?}");
        return Err(unavailable(format!("invalid event slug {slug:?}")));
    }

    let response = client
        .get(&path)
        .header(CACHE_CONTROL, "no-cache")
        .header(PRAGMA, "no-cache")
        .send()
        .await
        .map_err(|e| {
            warn!("Config request failed for {path}: {e}");
            unavailable(e.to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!("Config request for {path} returned {status}");
        return Err(unavailable(format!("HTTP {status}")));
    }

    let body = response.text().await.map_err(|e| unavailable(e.to_string()))?;
    let config: ConfigDocument = serde_json::from_str(&body).map_err(|e| {
        warn!("Config at {path} is not valid JSON: {e}");
        unavailable(format!("invalid config document: {e}"))
    })?;

    debug!("Loaded config for {slug} ({} tiers)", config.tiers.len());
    Ok(config)
}
