//! Resource locations derived from the event slug.

/// `<base>/events/<slug>/config.json`
pub fn config_path(base: &str, slug: &str) -> String {
    format!("{}/events/{slug}/config.json", base.trim_end_matches('/'))
}

/// `<base>/events/<slug>/assets/<filename>`. Absolute URLs pass through untouched.
pub fn asset_url(base: &str, slug: &str, filename: &str) -> String {
    if filename.starts_with("http://") || filename.starts_with("https://") {
        return filename.to_string();
    }
    format!(
        "{}/events/{slug}/assets/{}",
        base.trim_end_matches('/'),
        filename.trim_start_matches('/')
    )
}

/// Slugs end up in URL paths, so only `[A-Za-z0-9_-]` is allowed.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
