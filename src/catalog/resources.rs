//! Resource paths of the remote catalog API.
//!
//! Identifiers are percent-encoded so they always stay a single path segment
//! or query value.
use urlencoding::encode;

/// Series detail
pub(super) fn series(series_id: &str) -> String {
    format!("/api/series/{}", encode(series_id))
}

/// Episode detail with signed publication URLs
pub(super) fn episode(episode_id: &str) -> String {
    format!(
        "/api/events/{}?sign=true&withpublications=true",
        encode(episode_id)
    )
}

/// Episodes of a series, newest first then by title
pub(super) fn episodes_in_series(series_id: &str) -> String {
    format!(
        "/api/events?filter=is_part_of:{}&withpublications=true&sort=start_date:DESC,title:ASC&sign=true",
        encode(series_id)
    )
}

/// Bare episode existence probe
pub(super) fn episode_probe(id: &str) -> String {
    format!("/api/events/{}", encode(id))
}

/// Bare series existence probe
pub(super) fn series_probe(id: &str) -> String {
    series(id)
}
