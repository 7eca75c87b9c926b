use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::{config::Config, state::AppState};

/// Header carrying a test-only "now", in milliseconds since the Unix epoch.
pub const TEST_NOW_HEADER: &str = "x-test-now-ms";

/// The instant a request is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTime(pub DateTime<Utc>);

/// Reads the test clock override, if test mode allows it.
///
/// Outside test mode the header is ignored unconditionally.
fn test_override(config: &Config, headers: &HeaderMap) -> Option<DateTime<Utc>> {
    if !config.test_mode {
        return None;
    }

    let raw = headers.get(TEST_NOW_HEADER)?.to_str().ok()?;
    let parsed = raw
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis);

    if parsed.is_none() {
        tracing::warn!("⚠️  Ignoring unparseable {} header: {:?}", TEST_NOW_HEADER, raw);
    }
    parsed
}

/// A middleware that stamps each request with its `RequestTime`.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
pub async fn stamp_request_time(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let now = test_override(&state.config, request.headers()).unwrap_or_else(|| state.clock.now());
    request.extensions_mut().insert(RequestTime(now));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TEST_NOW_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn config(test_mode: bool) -> Config {
        let mut config = Config::in_memory("127.0.0.1:0".parse().unwrap());
        config.test_mode = test_mode;
        config
    }

    #[test]
    fn override_is_ignored_outside_test_mode() {
        assert_eq!(test_override(&config(false), &headers("1700000000000")), None);
    }

    #[test]
    fn override_is_read_in_test_mode() {
        let expected = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        assert_eq!(
            test_override(&config(true), &headers("1700000000000")),
            Some(expected)
        );
    }

    #[test]
    fn garbage_override_falls_back() {
        assert_eq!(test_override(&config(true), &headers("soon")), None);
        assert_eq!(test_override(&config(true), &HeaderMap::new()), None);
    }
}
