//! In-process upstream fakes for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use futures_util::future::BoxFuture;

use crate::proxy::ForwardError;
use crate::upstream::{Upstream, UpstreamRequest, UpstreamResponse};

/// What the fake answers with.
#[derive(Clone)]
pub(crate) enum Script {
    Respond {
        status: StatusCode,
        content_type: Option<&'static str>,
        body: Bytes,
    },
    Refuse,
}

/// Answers every request with the same scripted outcome and records what it saw.
pub(crate) struct ScriptedUpstream {
    script: Script,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<UpstreamRequest>>,
}

impl ScriptedUpstream {
    pub(crate) fn new(script: Script) -> Self {
        Self {
            script,
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn ok(content_type: &'static str, body: &'static [u8]) -> Self {
        Self::new(Script::Respond {
            status: StatusCode::OK,
            content_type: Some(content_type),
            body: Bytes::from_static(body),
        })
    }

    pub(crate) fn status(status: StatusCode) -> Self {
        Self::new(Script::Respond {
            status,
            content_type: Some("text/html"),
            body: Bytes::from_static(b"<h1>upstream error page</h1>"),
        })
    }

    pub(crate) fn refusing() -> Self {
        Self::new(Script::Refuse)
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen(&self) -> Vec<UpstreamRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Upstream for ScriptedUpstream {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'_, Result<UpstreamResponse, ForwardError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match &self.script {
                Script::Respond {
                    status,
                    content_type,
                    body,
                } => {
                    let mut headers = HeaderMap::new();
                    if let Some(ct) = *content_type {
                        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(ct));
                    }
                    Ok(UpstreamResponse {
                        status: *status,
                        headers,
                        body: body.clone(),
                    })
                }
                Script::Refuse => Err(ForwardError::Transport("connection refused".into())),
            }
        })
    }
}
