//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::config::units::{ByteSize, Seconds};

/// Cache lifetime advertised to clients when `cache.max_time` is unset.
pub const DEFAULT_MAX_AGE_SECS: u64 = 86_400;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Descriptive metadata and static assets.
    pub site: SiteConfig,

    /// Rule evaluation options.
    pub routing: RoutingConfig,

    /// Prefix rules, evaluated in order.
    pub proxies: Vec<ProxyRule>,

    /// In-memory response cache policy.
    pub cache: CacheConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Seconds used for `Cache-Control: max-age` on proxied responses.
    pub fn max_age_secs(&self) -> u64 {
        self.cache
            .max_time
            .map(Seconds::as_secs)
            .unwrap_or(DEFAULT_MAX_AGE_SECS)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Largest request body read before forwarding.
    pub max_request_body: ByteSize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_request_body: ByteSize::mib(16),
        }
    }
}

/// Site metadata shown on the listing page, plus optional static files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub footer: String,

    /// Free-form date the service was established, shown as-is.
    pub establish_time: Option<String>,

    /// HTML file served at `/`.
    pub homepage: Option<String>,

    /// Icon served at `/favicon.ico`.
    pub favicon: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "CDN proxy".to_string(),
            description: "Multi-origin CDN proxy".to_string(),
            footer: String::new(),
            establish_time: None,
            homepage: None,
            favicon: None,
        }
    }
}

/// Rule evaluation options.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Reorder rules by descending prefix length before matching.
    /// Off by default: rules are matched in the order they are written.
    pub longest_prefix_first: bool,
}

/// A path-prefix to origin mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProxyRule {
    /// Literal path prefix, e.g. "/img/".
    pub prefix: String,

    /// Base URL the stripped sub-path is resolved against.
    pub target: String,

    /// Redirect template for `?raw=true`; `{path}` is replaced with the sub-path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_redirect: Option<String>,

    /// Listed on `/list` (routing ignores it).
    #[serde(default = "default_visible")]
    pub visible: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_visible() -> bool {
    true
}

impl ProxyRule {
    /// Rule with the given prefix and target and every optional field unset.
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
            raw_redirect: None,
            visible: true,
            description: None,
        }
    }

    pub fn with_raw_redirect(mut self, template: impl Into<String>) -> Self {
        self.raw_redirect = Some(template.into());
        self
    }
}

/// Response cache policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the in-memory cache.
    pub enabled: bool,

    /// Capacity of the whole cache.
    pub max_size: ByteSize,

    /// Smallest response eligible for caching.
    pub min_size: ByteSize,

    /// File extensions (without the dot) eligible for caching.
    pub image_types: Vec<String>,

    /// Lifetime of cached entries; also drives `Cache-Control: max-age`.
    pub max_time: Option<Seconds>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_size: ByteSize::mib(1024),
            min_size: ByteSize::mib(8),
            image_types: ["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_time: None,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Longest wait for any single read from the origin (response headers or
    /// the next body chunk) in seconds.
    pub upstream_secs: u64,

    /// Whole inbound request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Number of entries kept for `/logs`.
    pub log_buffer_size: usize,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_buffer_size: 2000,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
