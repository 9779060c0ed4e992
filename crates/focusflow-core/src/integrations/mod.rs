//! Best-effort outbound calls. Nothing here sits on the path of a timer or
//! task state change; callers either await with a timeout and use a fallback,
//! or spawn and forget.

mod activity;
mod counter;

pub use activity::{ActivityClient, FALLBACK_ACTIVITY};
pub use counter::CompletionCounter;

use url::Url;

use crate::error::IntegrationError;

/// Parse an absolute http(s) URL.
pub(crate) fn parse_endpoint(raw: &str) -> Result<Url, IntegrationError> {
    let invalid = |message: String| IntegrationError::InvalidEndpoint {
        url: raw.to_string(),
        message,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_endpoint_accepts_http_and_https() {
        assert!(parse_endpoint("https://www.boredapi.com/api/activity").is_ok());
        assert!(parse_endpoint("http://127.0.0.1:1234/hit").is_ok());
    }

    #[test]
    fn parse_endpoint_rejects_garbage() {
        assert!(parse_endpoint("not a url").is_err());
        assert!(parse_endpoint("file:///etc/passwd").is_err());
    }
}
