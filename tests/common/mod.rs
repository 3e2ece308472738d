//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::Router;
use cdn_proxy::cache::{Clock, ResponseCache};
use cdn_proxy::config::ProxyConfig;
use cdn_proxy::http::HttpServer;
use cdn_proxy::observability::LogBuffer;
use cdn_proxy::Shutdown;
use tokio::net::TcpListener;

/// Start a mock origin serving `app` on an ephemeral port.
pub async fn start_origin(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A port nothing listens on.
#[allow(dead_code)]
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Counts requests seen by a mock origin.
#[derive(Clone, Default)]
pub struct HitCounter(Arc<AtomicUsize>);

#[allow(dead_code)]
impl HitCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A proxy running in the background.
#[allow(dead_code)]
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub cache: Arc<ResponseCache>,
    pub log: Arc<LogBuffer>,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Build and spawn a proxy for `config`, reading cache time from `clock`.
pub async fn start_proxy(config: ProxyConfig, clock: Arc<dyn Clock>) -> RunningProxy {
    let server = HttpServer::with_clock(config, clock).unwrap();
    let cache = server.cache();
    let log = server.log_buffer();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    RunningProxy {
        addr,
        cache,
        log,
        shutdown,
    }
}

/// A client that neither follows redirects nor uses a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
