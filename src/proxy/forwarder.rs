//! The image forwarder: validate, build target, fetch, relay.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::http::HeaderValue;

use crate::observability::metrics;
use crate::proxy::{ForwardError, Origin};
use crate::upstream::pipeline::require_success;
use crate::upstream::{Pipeline, Upstream, UpstreamRequest, UpstreamResponse};

/// Relayed when the upstream does not name a content type.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A successfully fetched payload, ready to relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedImage {
    pub content_type: HeaderValue,
    pub body: Bytes,
}

impl ForwardedImage {
    fn from_upstream(response: UpstreamResponse) -> Self {
        let content_type = response
            .content_type()
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
        Self {
            content_type,
            body: response.body,
        }
    }
}

/// Stateless pass-through from a relative path to `<origin>/<path>`.
///
/// Cheap to share: the only state is the immutable origin, the upstream
/// handle and the interceptor chain.
#[derive(Clone)]
pub struct Forwarder {
    origin: Origin,
    upstream: Arc<dyn Upstream>,
    pipeline: Pipeline,
}

impl Forwarder {
    pub fn new(origin: Origin, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            origin,
            upstream,
            pipeline: Pipeline::new(),
        }
    }

    /// Replace the interceptor chain.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Fetch `path` from the origin.
    ///
    /// `None` and `Some("")` are both [`ForwardError::MissingUrl`] and never
    /// reach the upstream.
    pub async fn forward(&self, path: Option<&str>) -> Result<ForwardedImage, ForwardError> {
        let path = path.filter(|p| !p.is_empty()).ok_or(ForwardError::MissingUrl)?;

        let mut request = UpstreamRequest::get(self.origin.join(path)?);
        self.pipeline.apply_request(&mut request)?;

        tracing::debug!(target_uri = %request.uri, "fetching from upstream");
        let started = Instant::now();
        let response = match self.upstream.send(request).await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_upstream("error", started);
                return Err(e);
            }
        };
        metrics::record_upstream(if response.status.is_success() { "ok" } else { "status" }, started);

        let response = require_success(response)?;
        let response = self.pipeline.apply_response(response)?;

        let image = ForwardedImage::from_upstream(response);
        metrics::record_payload(image.body.len());
        Ok(image)
    }
}
