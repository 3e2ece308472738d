//! Response handling and transformation.
//!
//! # Responsibilities
//! - Stamp proxy cache headers on successful responses
//! - Normalize `Content-Type` to carry a charset
//! - Strip hop-by-hop headers from relayed upstream responses
//! - Build the plain-text error and redirect responses
//!
//! # Design Decisions
//! - Header values are computed once at startup (`CacheHeaders`)
//! - Upstream failures and 2xx responses share the same cache headers
//! - Redirects are never cacheable

use axum::{
    body::Body,
    http::{
        header::{self, HeaderName, HeaderValue},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
};

use crate::cache::CachedResponse;
use crate::error::ProxyError;

pub const CDN_CACHE_CONTROL: HeaderName = HeaderName::from_static("cdn-cache-control");

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const UTF8_SUFFIX: &str = "; charset=utf-8";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const NO_STORE: &str = "no-cache, no-store, must-revalidate";

/// Headers that describe a single connection and must not be relayed.
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// `Cache-Control` / `CDN-Cache-Control` pair for a fixed max-age.
#[derive(Debug, Clone)]
pub struct CacheHeaders {
    max_age_secs: u64,
    cache_control: HeaderValue,
    cdn_cache_control: HeaderValue,
}

impl CacheHeaders {
    pub fn new(max_age_secs: u64) -> Self {
        Self {
            max_age_secs,
            cache_control: HeaderValue::from_str(&format!("public, max-age={max_age_secs}"))
                .unwrap_or_else(|_| HeaderValue::from_static("public")),
            cdn_cache_control: HeaderValue::from_str(&format!("max-age={max_age_secs}"))
                .unwrap_or_else(|_| HeaderValue::from_static("max-age=0")),
        }
    }

    pub fn max_age_secs(&self) -> u64 {
        self.max_age_secs
    }

    /// Overwrite any existing cache directives.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(header::CACHE_CONTROL, self.cache_control.clone());
        headers.insert(CDN_CACHE_CONTROL, self.cdn_cache_control.clone());
    }
}

/// Append `; charset=utf-8` unless a charset is already declared.
/// A missing type becomes `application/octet-stream; charset=utf-8`.
pub fn normalize_content_type(value: Option<&HeaderValue>) -> HeaderValue {
    let Some(value) = value else {
        return HeaderValue::from_static("application/octet-stream; charset=utf-8");
    };
    let Ok(text) = value.to_str() else {
        return value.clone();
    };
    if text.contains("charset") {
        return value.clone();
    }
    let base = if text.trim().is_empty() {
        DEFAULT_CONTENT_TYPE
    } else {
        text
    };
    HeaderValue::from_str(&format!("{base}{UTF8_SUFFIX}")).unwrap_or_else(|_| value.clone())
}

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Relay an upstream response head. The caller supplies the body.
pub fn relayed(status: StatusCode, mut headers: HeaderMap, body: Body) -> Response {
    strip_hop_by_hop(&mut headers);
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// A 2xx upstream response with proxy cache headers and normalized type.
pub fn success(
    status: StatusCode,
    mut headers: HeaderMap,
    content_type: HeaderValue,
    cache_headers: &CacheHeaders,
    body: Body,
) -> Response {
    headers.insert(header::CONTENT_TYPE, content_type);
    cache_headers.apply(&mut headers);
    relayed(status, headers, body)
}

/// Serve a stored entry.
pub fn cached(entry: CachedResponse, cache_headers: &CacheHeaders) -> Response {
    let mut response = Response::new(Body::from(entry.body));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, entry.content_type);
    cache_headers.apply(headers);
    response
}

/// 302 to `location`, marked non-cacheable.
pub fn redirect(location: &str) -> Result<Response, ProxyError> {
    let value = HeaderValue::from_str(location)
        .map_err(|_| ProxyError::InvalidRedirect(location.to_string()))?;
    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, value),
            (header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE)),
        ],
    )
        .into_response())
}

pub fn plain_text(status: StatusCode, body: &'static str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN))],
        body,
    )
        .into_response()
}

/// Map a request failure to its client response. Upstream failures carry
/// the cache headers like any proxied response.
pub fn from_error(err: &ProxyError, cache_headers: &CacheHeaders) -> Response {
    let mut response = plain_text(err.status(), err.public_message());
    if matches!(err, ProxyError::Upstream { .. }) {
        cache_headers.apply(response.headers_mut());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_headers_overwrite_upstream_values() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        CacheHeaders::new(86_400).apply(&mut headers);
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=86400");
        assert_eq!(headers[CDN_CACHE_CONTROL], "max-age=86400");
    }

    #[test]
    fn charset_appended_once() {
        let ct = HeaderValue::from_static("image/png");
        let once = normalize_content_type(Some(&ct));
        assert_eq!(once, "image/png; charset=utf-8");
        assert_eq!(normalize_content_type(Some(&once)), once);

        let declared = HeaderValue::from_static("text/html; charset=iso-8859-1");
        assert_eq!(normalize_content_type(Some(&declared)), declared);
    }

    #[test]
    fn missing_content_type_defaults_to_octet_stream() {
        assert_eq!(
            normalize_content_type(None),
            "application/octet-stream; charset=utf-8"
        );
    }

    #[test]
    fn relayed_drops_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert("x-origin", HeaderValue::from_static("1"));
        let response = relayed(StatusCode::NOT_FOUND, headers, Body::empty());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::CONNECTION).is_none());
        assert!(response.headers().get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(response.headers()["x-origin"], "1");
    }

    #[test]
    fn redirect_is_not_cacheable() {
        let response = redirect("https://raw.example/a.png").unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://raw.example/a.png");
        assert_eq!(response.headers()[header::CACHE_CONTROL], NO_STORE);
    }

    #[test]
    fn only_upstream_errors_carry_cache_headers() {
        let headers = CacheHeaders::new(60);
        let not_found = from_error(
            &ProxyError::NoRuleMatched {
                path: "/x".into(),
            },
            &headers,
        );
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert!(not_found.headers().get(CDN_CACHE_CONTROL).is_none());
    }
}
