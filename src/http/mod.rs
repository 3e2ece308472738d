//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → site.rs (/, /favicon.ico, /list, /logs on GET)
//!     → handler.rs (route, redirect, cache lookup)
//!     → forward.rs (upstream request, bounded body read)
//!     → response.rs (cache headers, content type)
//!     → Send to client
//! ```

pub mod forward;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;
pub mod site;

pub use request::X_REQUEST_ID;
pub use response::{CacheHeaders, CDN_CACHE_CONTROL};
pub use server::{AppState, HttpServer};
