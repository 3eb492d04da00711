//! Upstream client subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarder
//!     → pipeline.rs (request interceptors, may short-circuit)
//!     → Upstream::send (client.rs: hyper client + deadline)
//!     → success check (non-2xx → UpstreamStatus)
//!     → pipeline.rs (response interceptors, may short-circuit)
//! ```
//!
//! # Design Decisions
//! - `Upstream` is the seam between forwarding logic and the network, so
//!   tests can count calls without opening sockets
//! - Responses are fully buffered before they are handed back

pub mod client;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::body::Bytes;
use futures_util::future::BoxFuture;

use crate::proxy::ForwardError;

pub use client::HyperUpstream;
pub use pipeline::{Pipeline, RequestInterceptor, ResponseInterceptor};

/// A request about to be sent to the upstream origin.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl UpstreamRequest {
    /// A plain `GET` with no custom headers.
    pub fn get(uri: Uri) -> Self {
        Self {
            method: Method::GET,
            uri,
            headers: HeaderMap::new(),
        }
    }

    /// A `HEAD` with no custom headers.
    pub fn head(uri: Uri) -> Self {
        Self {
            method: Method::HEAD,
            ..Self::get(uri)
        }
    }
}

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// The upstream `Content-Type`, if it sent one.
    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.headers.get(header::CONTENT_TYPE)
    }
}

/// Anything that can carry an [`UpstreamRequest`] to the origin.
///
/// Implementations report network-level failures as
/// [`ForwardError::Transport`], [`ForwardError::Timeout`] or
/// [`ForwardError::Body`]. A non-2xx status is *not* an error at this layer.
pub trait Upstream: Send + Sync + 'static {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'_, Result<UpstreamResponse, ForwardError>>;
}
