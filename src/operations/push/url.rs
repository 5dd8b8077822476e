//! Merge-request URL extraction from push output
//!
//! The patterns follow GitLab's current `remote:` wording. They are kept
//! exactly as narrow as that wording; when GitLab changes its output, the
//! fallback still catches any bare merge-request URL.

use std::sync::LazyLock;

use regex::Regex;

/// `remote: View merge request for <branch>:` followed by `remote: <url>`.
static VIEW_MERGE_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)remote:\s*View merge request for[^\n]*\n\s*remote:\s*(https?://[^\s]+/-/merge_requests/\d+)",
    )
    .expect("merge request pattern is valid")
});

/// Any merge-request URL anywhere in the text.
static MERGE_REQUEST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://[^\s]+/-/merge_requests/\d+").expect("URL pattern is valid")
});

/// URL of the merge request the push created or updated, if the output names one.
///
/// Absence is normal: a push that only updates an existing merge request,
/// or a server that ignores push options, prints no URL.
pub fn extract_merge_request_url(output: &str) -> Option<String> {
    if let Some(url) = VIEW_MERGE_REQUEST
        .captures(output)
        .and_then(|captures| captures.get(1))
    {
        return Some(url.as_str().trim().to_string());
    }

    MERGE_REQUEST_URL
        .find(output)
        .map(|m| m.as_str().trim().to_string())
}
