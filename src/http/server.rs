//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the site endpoints and the proxy fallback
//! - Wire up middleware (tracing, timeout, request ID)
//! - Build shared state (route table, cache, upstream client, log buffer)
//! - Bind server to listener and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::cache::{CachePolicy, Clock, ResponseCache, SystemClock};
use crate::config::{validation::validate_config, ProxyConfig};
use crate::error::ServerError;
use crate::http::forward::Forwarder;
use crate::http::handler::proxy_handler;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::CacheHeaders;
use crate::http::site::{self, Site, FAVICON_PATH, LIST_PATH, LOGS_PATH};
use crate::observability::LogBuffer;
use crate::routing::Router as ProxyRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub cache: Arc<ResponseCache>,
    pub forwarder: Forwarder,
    pub cache_headers: CacheHeaders,
    pub log: Arc<LogBuffer>,
    pub site: Arc<Site>,
}

/// HTTP server for the CDN proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`HttpServer::new`], with the cache reading time from `clock`.
    pub fn with_clock(config: ProxyConfig, clock: Arc<dyn Clock>) -> Result<Self, ServerError> {
        validate_config(&config)?;

        let proxy_router = Arc::new(ProxyRouter::from_rules(
            config.proxies.clone(),
            config.routing.longest_prefix_first,
        )?);
        let cache = Arc::new(ResponseCache::new(
            CachePolicy::from_config(&config.cache),
            clock,
        ));
        let forwarder = Forwarder::new(&config.timeouts, config.listener.max_request_body.as_u64())?;

        let state = AppState {
            router: proxy_router,
            cache,
            forwarder,
            cache_headers: CacheHeaders::new(config.max_age_secs()),
            log: Arc::new(LogBuffer::new(config.observability.log_buffer_size)),
            site: Arc::new(Site::load(config.site.clone())),
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(site::homepage).fallback(proxy_handler))
            .route(FAVICON_PATH, get(site::favicon).fallback(proxy_handler))
            .route(LIST_PATH, get(site::list).fallback(proxy_handler))
            .route(LOGS_PATH, get(site::logs).fallback(proxy_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(request.headers()),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests
    /// and drop every cache entry.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");
        self.state.log.info(format!("[server] listening on {addr}"));

        let cache = self.state.cache.clone();
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        cache.clear();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn cache(&self) -> Arc<ResponseCache> {
        self.state.cache.clone()
    }

    pub fn log_buffer(&self) -> Arc<LogBuffer> {
        self.state.log.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyRule;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn server() -> HttpServer {
        let mut config = ProxyConfig::default();
        config.proxies = vec![ProxyRule::new("/img/", "http://127.0.0.1:9/base/")];
        HttpServer::new(config).unwrap()
    }

    #[tokio::test]
    async fn unmatched_path_is_not_found() {
        let app = server().router;
        let response = app
            .oneshot(Request::get("/nothing/here").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn homepage_unavailable_without_file() {
        let app = server().router;
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn raw_redirect_needs_no_upstream() {
        let app = server().router;
        let response = app
            .oneshot(Request::get("/img/a.png?raw=true").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()["location"],
            "http://127.0.0.1:9/base/a.png"
        );
    }

    #[test]
    fn invalid_rules_fail_construction() {
        let mut config = ProxyConfig::default();
        config.proxies = vec![ProxyRule::new("/x/", "ftp://example.com/")];
        assert!(matches!(
            HttpServer::new(config),
            Err(ServerError::Config(_))
        ));
    }
}
