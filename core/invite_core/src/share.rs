//! Share links: the current page URL with the state written back as query
//! parameters.

use thiserror::Error;
use url::Url;

use crate::resolver::{
    PARAM_EVENT, PARAM_FROM, PARAM_LANG, PARAM_MUSIC, PARAM_NAME, PARAM_REF, PARAM_TIER, PARAM_TO,
};
use crate::state::ApplicationState;

const STATE_PARAMS: [&str; 8] = [
    PARAM_EVENT,
    PARAM_LANG,
    PARAM_NAME,
    PARAM_TO,
    PARAM_FROM,
    PARAM_REF,
    PARAM_TIER,
    PARAM_MUSIC,
];

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("invalid page URL {url:?}: {source}")]
    InvalidPageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Build the share link for `state` on top of `page_url`.
///
/// Parameters that do not belong to the state are kept in their original
/// order; state parameters follow, empty ones omitted. `to` is rewritten as
/// `name`.
pub fn build_share_link(page_url: &str, state: &ApplicationState) -> Result<String, ShareError> {
    let mut url = Url::parse(page_url).map_err(|source| ShareError::InvalidPageUrl {
        url: page_url.to_string(),
        source,
    })?;

    let foreign: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !STATE_PARAMS.contains(&&**k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (k, v) in &foreign {
            query.append_pair(k, v);
        }
        query.append_pair(PARAM_EVENT, state.event_slug());
        query.append_pair(PARAM_LANG, state.locale.code());
        for (key, value) in [
            (PARAM_NAME, &state.guest_name),
            (PARAM_FROM, &state.sender_name),
            (PARAM_REF, &state.referral_code),
            (PARAM_TIER, &state.selected_tier_id),
        ] {
            if !value.is_empty() {
                query.append_pair(key, value);
            }
        }
        if state.music_enabled {
            query.append_pair(PARAM_MUSIC, "1");
        }
    }

    Ok(url.to_string())
}

/// Query component of a share link, suitable for [`crate::resolver::resolve`].
pub fn share_query(link: &str) -> Option<String> {
    Url::parse(link).ok()?.query().map(str::to_string)
}
