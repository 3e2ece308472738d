//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the shared HTTP client (timeouts, decompression)
//! - Send the client's method, headers, query, and body to the resolved target
//! - Read a response body up to a byte limit for cache admission
//!
//! # Design Decisions
//! - `Host` is never forwarded; the client sets it from the target URL
//! - `upstream_secs` bounds each read from the origin, not the whole
//!   transfer, so a slow but steady body is never cut off mid-stream
//! - Request bodies are read up to `listener.max_request_body` and only
//!   attached for methods other than GET and HEAD
//! - A body that outgrows the limit falls back to streaming, with the bytes
//!   already read replayed first

use axum::{
    body::Body,
    http::{header, HeaderMap, Method},
};
use bytes::{Bytes, BytesMut};
use futures_util::{stream, StreamExt};
use url::Url;

use crate::config::TimeoutConfig;
use crate::error::ProxyError;
use crate::http::response::strip_hop_by_hop;
use crate::routing::QueryParams;

/// Sends proxied requests upstream. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    max_request_body: usize,
}

impl Forwarder {
    pub fn new(timeouts: &TimeoutConfig, max_request_body: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(timeouts.connect_secs))
            .read_timeout(std::time::Duration::from_secs(timeouts.upstream_secs))
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            max_request_body: usize::try_from(max_request_body).unwrap_or(usize::MAX),
        })
    }

    /// Forward one request to `target`. Any transport failure (DNS, connect,
    /// TLS, timeout) is reported as [`ProxyError::Upstream`]; an unreadable or
    /// oversized inbound body as [`ProxyError::RequestBody`].
    pub async fn forward(
        &self,
        method: Method,
        mut target: Url,
        headers: &HeaderMap,
        query: &QueryParams,
        body: Body,
    ) -> Result<reqwest::Response, ProxyError> {
        if !query.is_empty() {
            target.query_pairs_mut().extend_pairs(query.iter());
        }

        let mut outbound = headers.clone();
        outbound.remove(header::HOST);
        strip_hop_by_hop(&mut outbound);

        let mut request = self
            .client
            .request(method.clone(), target.clone())
            .headers(outbound);
        if method != Method::GET && method != Method::HEAD {
            let bytes = axum::body::to_bytes(body, self.max_request_body)
                .await
                .map_err(ProxyError::RequestBody)?;
            request = request.body(bytes);
        }

        request.send().await.map_err(|source| ProxyError::Upstream {
            method,
            url: target,
            source,
        })
    }
}

/// Result of reading an upstream body with a byte limit.
#[derive(Debug)]
pub enum Collected {
    /// The whole body fit under the limit.
    Complete(Bytes),
    /// The limit was passed; `head` holds what was read so far.
    Overflow {
        head: Vec<Bytes>,
        rest: reqwest::Response,
    },
}

impl Collected {
    /// Turn a partial read back into a streaming body.
    pub fn into_body(self) -> Body {
        match self {
            Collected::Complete(bytes) => Body::from(bytes),
            Collected::Overflow { head, rest } => {
                let head = stream::iter(head.into_iter().map(Ok::<_, reqwest::Error>));
                Body::from_stream(head.chain(rest.bytes_stream()))
            }
        }
    }
}

/// Read `response` until it ends or exceeds `limit` bytes.
pub async fn collect_limited(
    mut response: reqwest::Response,
    limit: u64,
) -> Result<Collected, reqwest::Error> {
    let mut chunks = Vec::new();
    let mut total: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        total += chunk.len() as u64;
        chunks.push(chunk);
        if total > limit {
            return Ok(Collected::Overflow {
                head: chunks,
                rest: response,
            });
        }
    }

    Ok(Collected::Complete(concat(chunks, total)))
}

fn concat(mut chunks: Vec<Bytes>, total: u64) -> Bytes {
    if chunks.len() == 1 {
        return chunks.pop().unwrap_or_default();
    }
    let mut buf = BytesMut::with_capacity(total as usize);
    for chunk in chunks {
        buf.extend_from_slice(&chunk);
    }
    buf.freeze()
}
