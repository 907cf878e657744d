//! Shared HTTP response helpers.
//!
//! Centralizes status-code checks (429 rate limiting with `Retry-After`
//! parsing, non-success → [`FetchError::Status`]) so the download loop
//! only deals with streaming the body.

use crate::error::FetchError;

/// Longest body excerpt kept in a status error.
const MAX_MESSAGE_LEN: usize = 512;

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **429 Too Many Requests** → [`FetchError::RateLimited`] with
///   `Retry-After` header parsing (falls back to 60 s if absent or
///   unparseable).
/// - **Non-success status** → [`FetchError::Status`] with status code and
///   the start of the response body.
pub async fn check_response(
    url: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, FetchError> {
    if resp.status() == 429 {
        let retry_after = parse_retry_after(&resp);
        return Err(FetchError::RateLimited {
            url: url.to_string(),
            retry_after_secs: retry_after,
        });
    }
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let mut message = resp.text().await.unwrap_or_default();
        if message.len() > MAX_MESSAGE_LEN {
            let mut cut = MAX_MESSAGE_LEN;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
            message: message.trim().to_string(),
        });
    }
    Ok(resp)
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}
