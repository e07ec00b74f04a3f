use std::sync::LazyLock;

use regex::Regex;

static RECORD_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([a-f0-9]{24})$").expect("record id regex is valid"));

/// Extracts the trailing 24-hex record id from an applookup URL.
/// Returns `None` for missing input or when no such suffix exists.
pub fn extract_record_id(url: Option<&str>) -> Option<String> {
    let url = url?;
    RECORD_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// Builds the applookup URL the remote store expects for a relationship
/// field. Exact inverse of [`extract_record_id`] for any valid record id.
pub fn record_url(base_url: &str, app_id: &str, record_id: &str) -> String {
    format!("{base_url}/apps/{app_id}/records/{record_id}")
}
