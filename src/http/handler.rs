//! Proxy request handler.
//!
//! # Responsibilities
//! - Match the request path against the route table
//! - Sanitize and resolve the remainder under the route's target
//! - Answer `raw=true` with a redirect
//! - Serve cache hits, otherwise forward upstream
//! - Buffer admissible 2xx bodies and insert them into the cache
//!
//! # Design Decisions
//! - Every failure ends in a response; nothing propagates past the handler
//! - Non-2xx upstream responses are relayed as-is and never cached
//! - Responses are streamed unless the cache policy may admit them
//! - HEAD may be answered from the cache but never populates it

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request},
    response::Response,
};

use crate::cache::extension_of;
use crate::error::ProxyError;
use crate::http::forward::{collect_limited, Collected};
use crate::http::request::request_id;
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{build_redirect, sanitize, QueryParams, RouteMatch};

/// How a request was answered, as recorded in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NoRoute,
    Rejected,
    Redirect,
    CacheHit,
    Forwarded,
    Cached,
    Relayed,
    UpstreamError,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::NoRoute => "no_route",
            Outcome::Rejected => "rejected",
            Outcome::Redirect => "redirect",
            Outcome::CacheHit => "cache_hit",
            Outcome::Forwarded => "forwarded",
            Outcome::Cached => "cached",
            Outcome::Relayed => "relayed",
            Outcome::UpstreamError => "upstream_error",
        }
    }
}

/// Entry point for every path that is not a site endpoint.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(request_id = %request_id, method = %method, path = %path, "Proxying request");
    state.log.info(format!("[request] {method} {path}"));

    let (response, outcome) = match route_request(&state, request).await {
        Ok(done) => done,
        Err(err) => {
            let outcome = match err {
                ProxyError::NoRuleMatched { .. } => {
                    tracing::debug!(request_id = %request_id, path = %path, "No rule matched");
                    state.log.info(format!("[request] no rule for {path}"));
                    Outcome::NoRoute
                }
                ProxyError::Upstream { .. } => {
                    tracing::error!(request_id = %request_id, error = %err, "Upstream request failed");
                    state.log.error(format!("[proxy] {err}"));
                    Outcome::UpstreamError
                }
                _ => {
                    tracing::warn!(request_id = %request_id, error = %err, "Request rejected");
                    state.log.warn(format!("[request] rejected: {err}"));
                    Outcome::Rejected
                }
            };
            (response::from_error(&err, &state.cache_headers), outcome)
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), outcome.as_str(), start);
    tracing::debug!(
        request_id = %request_id,
        status = response.status().as_u16(),
        outcome = outcome.as_str(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request finished"
    );
    response
}

async fn route_request(
    state: &AppState,
    request: Request<Body>,
) -> Result<(Response, Outcome), ProxyError> {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();
    let query = QueryParams::parse(parts.uri.query());

    let RouteMatch { route, sub_path } = state
        .router
        .match_path(path)
        .ok_or_else(|| ProxyError::NoRuleMatched {
            path: path.to_string(),
        })?;

    let sanitized = sanitize(sub_path);
    let target = route.resolve(&sanitized)?;

    if query.wants_raw() {
        let location = build_redirect(route.rule(), &sanitized, &target, &query);
        state.log.info(format!("[redirect] {path} -> {location}"));
        return Ok((response::redirect(&location)?, Outcome::Redirect));
    }

    if let Some(hit) = state.cache.lookup(path) {
        state
            .log
            .info(format!("[cache] hit {path} ({} bytes)", hit.body.len()));
        return Ok((response::cached(hit, &state.cache_headers), Outcome::CacheHit));
    }

    state.log.info(format!("[proxy] {} {target}", parts.method));
    let method = parts.method.clone();
    let upstream = state
        .forwarder
        .forward(parts.method, target.clone(), &parts.headers, &query, body)
        .await?;

    let status = upstream.status();
    let headers = upstream.headers().clone();

    if !status.is_success() {
        state.log.info(format!("[proxy] {target} answered {status}"));
        let body = Body::from_stream(upstream.bytes_stream());
        return Ok((response::relayed(status, headers, body), Outcome::Relayed));
    }

    let content_type = response::normalize_content_type(headers.get(header::CONTENT_TYPE));
    let ext = extension_of(target.path());
    let policy = state.cache.policy();

    if method == Method::HEAD || !policy.may_cache(ext.as_deref(), upstream.content_length()) {
        let body = Body::from_stream(upstream.bytes_stream());
        let response = response::success(status, headers, content_type, &state.cache_headers, body);
        return Ok((response, Outcome::Forwarded));
    }

    let collected = collect_limited(upstream, policy.max_size)
        .await
        .map_err(|source| ProxyError::Upstream {
            method,
            url: target.clone(),
            source,
        })?;

    let (body, outcome) = match collected {
        Collected::Complete(bytes) => {
            let stored = ext.as_deref().is_some_and(|ext| {
                state
                    .cache
                    .store(path, ext, bytes.clone(), content_type.clone())
            });
            if stored {
                state
                    .log
                    .info(format!("[cache] stored {path} ({} bytes)", bytes.len()));
            }
            let outcome = if stored { Outcome::Cached } else { Outcome::Forwarded };
            (Body::from(bytes), outcome)
        }
        overflow @ Collected::Overflow { .. } => (overflow.into_body(), Outcome::Forwarded),
    };

    let response = response::success(status, headers, content_type, &state.cache_headers, body);
    Ok((response, outcome))
}
