//! Cache key builders for all BizHub cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses. Providers add their own
//! namespace prefix on top.

/// Key marking a revoked token, by token digest.
pub fn revoked_token(token_digest: &str) -> String {
    format!("auth:revoked:{token_digest}")
}

/// Key of a fixed-window attempt counter.
///
/// `window_start` is the window's start as a unix timestamp, so each window
/// gets a fresh key and old counters simply expire.
pub fn rate_limit(scope: &str, client: &str, window_start: i64) -> String {
    format!("ratelimit:{scope}:{client}:{window_start}")
}
