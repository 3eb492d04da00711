//! Request/response interceptor chain around the upstream call.
//!
//! Interceptors run in registration order. The first one that returns an
//! error stops the chain; for request interceptors that also means the
//! upstream is never contacted.

use std::sync::Arc;

use crate::proxy::ForwardError;
use crate::upstream::{UpstreamRequest, UpstreamResponse};

/// Inspects or rewrites a request before it is sent.
pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, request: &mut UpstreamRequest) -> Result<(), ForwardError>;
}

/// Inspects or rewrites a successful (2xx) response before it is relayed.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, response: UpstreamResponse) -> Result<UpstreamResponse, ForwardError>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(&mut UpstreamRequest) -> Result<(), ForwardError> + Send + Sync,
{
    fn on_request(&self, request: &mut UpstreamRequest) -> Result<(), ForwardError> {
        self(request)
    }
}

impl<F> ResponseInterceptor for F
where
    F: Fn(UpstreamResponse) -> Result<UpstreamResponse, ForwardError> + Send + Sync,
{
    fn on_response(&self, response: UpstreamResponse) -> Result<UpstreamResponse, ForwardError> {
        self(response)
    }
}

/// Ordered interceptor chain. Empty by default.
#[derive(Clone, Default)]
pub struct Pipeline {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request interceptor.
    pub fn on_request(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.request.push(Arc::new(interceptor));
        self
    }

    /// Append a response interceptor.
    pub fn on_response(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.response.push(Arc::new(interceptor));
        self
    }

    pub(crate) fn apply_request(&self, request: &mut UpstreamRequest) -> Result<(), ForwardError> {
        for interceptor in &self.request {
            interceptor.on_request(request)?;
        }
        Ok(())
    }

    pub(crate) fn apply_response(
        &self,
        mut response: UpstreamResponse,
    ) -> Result<UpstreamResponse, ForwardError> {
        for interceptor in &self.response {
            response = interceptor.on_response(response)?;
        }
        Ok(response)
    }
}

/// Fails with [`ForwardError::UpstreamStatus`] unless the status is 2xx.
///
/// The forwarder runs this between the upstream call and the response
/// interceptors, so response interceptors only ever see successful responses.
pub fn require_success(response: UpstreamResponse) -> Result<UpstreamResponse, ForwardError> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(ForwardError::UpstreamStatus(response.status))
    }
}
