//! Config-driven CDN reverse proxy library.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, ServerError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
