//! Response header filtering.
//!
//! These headers describe the upstream hop's framing. The relayed body is
//! re-framed by our own server, so echoing them would be wrong.

use axum::http::{header, HeaderMap, HeaderName};

/// Response headers never relayed to the caller.
pub const EXCLUDED_RESPONSE_HEADERS: [HeaderName; 4] = [
    header::CONTENT_ENCODING,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

pub fn is_excluded(name: &HeaderName) -> bool {
    EXCLUDED_RESPONSE_HEADERS.contains(name)
}

/// Copy of `upstream` without the excluded headers. Repeated headers keep
/// every value, in order.
pub fn filter_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if !is_excluded(name) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn strips_framing_headers_regardless_of_case() {
        let mut upstream = HeaderMap::new();
        for (name, value) in [
            ("Content-Type", "text/plain"),
            ("CONTENT-LENGTH", "5"),
            ("Content-Encoding", "gzip"),
            ("transfer-encoding", "chunked"),
            ("Connection", "keep-alive"),
        ] {
            upstream.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_static(value),
            );
        }

        let filtered = filter_response_headers(&upstream);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[header::CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn keeps_cors_cache_and_custom_headers_with_all_values() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        upstream.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=4"));
        upstream.insert("x-edge-pop", HeaderValue::from_static("fra1"));
        upstream.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        upstream.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));

        let filtered = filter_response_headers(&upstream);

        assert_eq!(filtered[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(filtered[header::CACHE_CONTROL], "max-age=4");
        assert_eq!(filtered["x-edge-pop"], "fra1");
        let cookies: Vec<_> = filtered.get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
    }
}
