//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Fall back to defaults when asked to
//! - Log the rule table and cache settings once the server is built
//!
//! # Design Decisions
//! - Fail fast: a bad config file is fatal unless the fallback is requested
//! - Listeners start last (traffic only when ready)

use std::path::Path;

use crate::config::{ConfigError, ProxyConfig};
use crate::http::HttpServer;

/// Settle the outcome of loading the config at `path`. With
/// `fallback_to_default`, a failure is logged and the built-in defaults are
/// used instead.
pub fn resolve_startup_config(
    path: &Path,
    loaded: Result<ProxyConfig, ConfigError>,
    fallback_to_default: bool,
) -> Result<ProxyConfig, ConfigError> {
    match loaded {
        Ok(config) => {
            tracing::info!(
                path = %path.display(),
                rules = config.proxies.len(),
                "Configuration loaded"
            );
            Ok(config)
        }
        Err(e) if fallback_to_default => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to load configuration, using defaults"
            );
            Ok(ProxyConfig::default())
        }
        Err(e) => Err(e),
    }
}

/// Log the effective rule table, cache policy, and advertised lifetime.
pub fn log_startup_banner(server: &HttpServer) {
    let config = server.config();
    let state = server.state();
    let days = config.max_age_secs() / 86_400;

    tracing::info!(
        title = %config.site.title,
        version = env!("CARGO_PKG_VERSION"),
        max_age_secs = config.max_age_secs(),
        "CDN proxy starting"
    );
    state
        .log
        .info(format!("[server] {} v{}", config.site.title, env!("CARGO_PKG_VERSION")));
    state
        .log
        .info(format!("[server] cache lifetime {days} day(s)"));

    let policy = state.cache.policy();
    tracing::info!(
        enabled = policy.enabled,
        max_size = %config.cache.max_size,
        min_size = %config.cache.min_size,
        ttl_secs = policy.ttl.map(|t| t.as_secs()),
        "Response cache"
    );

    for route in state.router.routes() {
        let rule = route.rule();
        tracing::info!(
            prefix = %rule.prefix,
            target = %route.target(),
            raw_redirect = rule.raw_redirect.as_deref(),
            visible = rule.visible,
            "Proxy rule"
        );
        state
            .log
            .info(format!("[rule] {} -> {}", rule.prefix, route.target()));
    }
}
