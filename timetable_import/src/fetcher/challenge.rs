use reqwest::header::HeaderMap;
use reqwest::StatusCode;

const INTERSTITIAL_MARKERS: [&str; 4] = [
    "challenge-platform",
    "cf_chl_opt",
    "<title>Just a moment...</title>",
    "Attention Required! | Cloudflare",
];

/// Whether a response is an anti-bot interstitial rather than the page asked for.
pub fn is_challenge(status: StatusCode, headers: &HeaderMap, body: &str) -> bool {
    if !matches!(status.as_u16(), 403 | 429 | 503) {
        return false;
    }
    let mitigated = headers
        .get("cf-mitigated")
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.eq_ignore_ascii_case("challenge"));

    mitigated || INTERSTITIAL_MARKERS.iter().any(|marker| body.contains(marker))
}
