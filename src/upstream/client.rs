//! hyper-based upstream client.
//!
//! Redirects (301, 302, 303, 307, 308) are followed up to
//! `upstream.max_redirects` hops. Every hop shares the one exchange deadline.
//! A redirect without a `Location` header is handed back as-is.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Uri};
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::config::UpstreamConfig;
use crate::proxy::target::to_uri;
use crate::proxy::ForwardError;
use crate::resilience::with_deadline;
use crate::upstream::{Upstream, UpstreamRequest, UpstreamResponse};

/// Pooled plain-HTTP client with a per-exchange deadline and a body limit.
#[derive(Clone)]
pub struct HyperUpstream {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_body_bytes: usize,
    max_redirects: usize,
}

impl HyperUpstream {
    pub fn new(config: &UpstreamConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_body_bytes: config.max_body_bytes,
            max_redirects: config.max_redirects,
        }
    }

    /// Shareable handle for [`Forwarder`](crate::proxy::Forwarder) and
    /// [`Readiness`](crate::health::Readiness).
    pub fn shared(config: &UpstreamConfig) -> Arc<dyn Upstream> {
        Arc::new(Self::new(config))
    }

    async fn exchange(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ForwardError> {
        let UpstreamRequest {
            mut method,
            mut uri,
            headers,
        } = request;
        let mut hops = 0;

        loop {
            let mut builder = Request::builder().method(method.clone()).uri(uri.clone());
            if let Some(request_headers) = builder.headers_mut() {
                request_headers.extend(headers.clone());
            }
            let req = builder
                .body(Body::empty())
                .map_err(|e| ForwardError::Transport(Box::new(e)))?;

            let response = self
                .client
                .request(req)
                .await
                .map_err(|e| ForwardError::Transport(Box::new(e)))?;

            let (parts, body) = response.into_parts();

            if let Some(next) = redirect_location(&uri, parts.status, &parts.headers)? {
                if hops >= self.max_redirects {
                    return Err(ForwardError::Transport(
                        format!("maximum redirect reached at {uri}").into(),
                    ));
                }
                hops += 1;
                tracing::debug!(from = %uri, to = %next, status = %parts.status, "following upstream redirect");

                if parts.status == StatusCode::SEE_OTHER && method != Method::HEAD {
                    method = Method::GET;
                }
                uri = next;
                continue;
            }

            let body = axum::body::to_bytes(Body::new(body), self.max_body_bytes)
                .await
                .map_err(ForwardError::Body)?;

            return Ok(UpstreamResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            });
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Where a redirect points, resolved against the URI that produced it.
fn redirect_location(
    current: &Uri,
    status: StatusCode,
    headers: &HeaderMap,
) -> Result<Option<Uri>, ForwardError> {
    if !is_redirect(status) {
        return Ok(None);
    }
    let Some(location) = headers.get(header::LOCATION) else {
        return Ok(None);
    };

    let invalid = |detail: String| {
        ForwardError::Transport(format!("invalid redirect location from {current}: {detail}").into())
    };
    let location = location.to_str().map_err(|e| invalid(e.to_string()))?;
    let base = Url::parse(&current.to_string()).map_err(|e| invalid(e.to_string()))?;
    let next = base.join(location).map_err(|e| invalid(e.to_string()))?;
    let next = to_uri(next).map_err(|e| invalid(e.to_string()))?;

    Ok(Some(next))
}

impl Upstream for HyperUpstream {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'_, Result<UpstreamResponse, ForwardError>> {
        Box::pin(with_deadline(self.timeout, self.exchange(request)))
    }
}
