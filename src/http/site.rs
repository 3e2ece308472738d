//! Site endpoints served by the proxy itself.
//!
//! # Responsibilities
//! - `GET /`: the configured homepage
//! - `GET /favicon.ico`: the configured icon
//! - `GET /list`: service status, cache usage, and the visible rules
//! - `GET /logs`: the activity ring buffer
//!
//! # Design Decisions
//! - Assets are read once at startup; a missing file is logged, not fatal
//! - Only GET is handled here; other methods fall through to the proxy

use std::path::Path;
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;

use crate::cache::CacheStats;
use crate::config::{ByteSize, SiteConfig};
use crate::http::response;
use crate::http::server::AppState;

pub const LIST_PATH: &str = "/list";
pub const LOGS_PATH: &str = "/logs";
pub const FAVICON_PATH: &str = "/favicon.ico";

const SECS_PER_DAY: u64 = 86_400;

/// Site metadata and static assets, loaded at startup.
#[derive(Debug)]
pub struct Site {
    config: SiteConfig,
    homepage: Option<Bytes>,
    favicon: Option<Bytes>,
    started_at: Instant,
}

impl Site {
    pub fn load(config: SiteConfig) -> Self {
        let homepage = config.homepage.as_deref().and_then(|p| read_asset(p, "homepage"));
        let favicon = config.favicon.as_deref().and_then(|p| read_asset(p, "favicon"));
        Self {
            config,
            homepage,
            favicon,
            started_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

fn read_asset(path: &str, what: &'static str) -> Option<Bytes> {
    match std::fs::read(Path::new(path)) {
        Ok(bytes) => {
            tracing::debug!(asset = what, path = %path, size = bytes.len(), "Loaded site asset");
            Some(Bytes::from(bytes))
        }
        Err(e) => {
            tracing::warn!(asset = what, path = %path, error = %e, "Failed to load site asset");
            None
        }
    }
}

pub async fn homepage(State(state): State<AppState>) -> Response {
    let Some(page) = state.site.homepage.clone() else {
        return response::plain_text(StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable");
    };
    let mut response = (
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"))],
        page,
    )
        .into_response();
    state.cache_headers.apply(response.headers_mut());
    response
}

pub async fn favicon(State(state): State<AppState>) -> Response {
    let Some(icon) = state.site.favicon.clone() else {
        return response::plain_text(StatusCode::NOT_FOUND, "Not Found");
    };
    let mut response = (
        [(header::CONTENT_TYPE, HeaderValue::from_static("image/x-icon"))],
        icon,
    )
        .into_response();
    state.cache_headers.apply(response.headers_mut());
    response
}

pub async fn logs(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        state.log.render(),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct Listing {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub title: String,
    pub description: String,
    pub footer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub establish_time: Option<String>,
    pub cache_max_age_days: u64,
    pub cache: CacheSummary,
    pub proxies: Vec<RuleSummary>,
}

#[derive(Debug, Serialize)]
pub struct CacheSummary {
    pub enabled: bool,
    #[serde(flatten)]
    pub stats: CacheStats,
    pub size: String,
    pub max_size: String,
}

#[derive(Debug, Serialize)]
pub struct RuleSummary {
    pub prefix: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_redirect: Option<String>,
    pub example: String,
    pub raw_example: String,
}

pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> Json<Listing> {
    let base = public_base(&headers);
    let site = state.site.config();
    let stats = state.cache.stats();

    let proxies = state
        .router
        .routes()
        .iter()
        .map(|route| route.rule())
        .filter(|rule| rule.visible)
        .map(|rule| RuleSummary {
            prefix: rule.prefix.clone(),
            target: rule.target.clone(),
            description: rule.description.clone(),
            raw_redirect: rule.raw_redirect.clone(),
            example: format!("{base}{}", rule.prefix),
            raw_example: format!("{base}{}?raw=true", rule.prefix),
        })
        .collect();

    Json(Listing {
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.site.uptime_secs(),
        title: site.title.clone(),
        description: site.description.clone(),
        footer: site.footer.clone(),
        establish_time: site.establish_time.clone(),
        cache_max_age_days: state.cache_headers.max_age_secs() / SECS_PER_DAY,
        cache: CacheSummary {
            enabled: state.cache.is_enabled(),
            size: ByteSize::bytes(stats.size_bytes).to_string(),
            max_size: ByteSize::bytes(stats.max_size_bytes).to_string(),
            stats,
        },
        proxies,
    })
}

/// `<scheme>://<host>` as seen by the client.
fn public_base(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}
