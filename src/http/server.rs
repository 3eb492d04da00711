//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the image and health handlers
//! - Wire up middleware (request ID, tracing, inbound timeout)
//! - Serve on a listener until the shutdown broadcast fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{validate_config, ConfigError, ProxyConfig, ValidationError};
use crate::health::{handlers, Readiness};
use crate::http::request::{
    propagate_request_id_layer, request_span, set_request_id_layer, ImageQuery,
};
use crate::observability::metrics;
use crate::proxy::{Forwarder, Origin};
use crate::upstream::{HyperUpstream, Pipeline, Upstream};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub readiness: Arc<Readiness>,
}

/// HTTP server for the image proxy.
pub struct HttpServer {
    config: ProxyConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server that reaches the origin over plain HTTP.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let upstream = HyperUpstream::shared(&config.upstream);
        Self::with_upstream(config, upstream)
    }

    /// Create a server on top of any [`Upstream`] implementation.
    pub fn with_upstream(config: ProxyConfig, upstream: Arc<dyn Upstream>) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let origin = Origin::parse(&config.upstream.origin).map_err(|e| {
            ConfigError::Validation(vec![ValidationError {
                field: "upstream.origin",
                message: e.to_string(),
            }])
        })?;

        let forwarder = Forwarder::new(origin.clone(), upstream.clone());
        let readiness = Readiness::new(origin, upstream);

        Ok(Self {
            config,
            state: AppState {
                forwarder: Arc::new(forwarder),
                readiness: Arc::new(readiness),
            },
        })
    }

    /// Install an interceptor chain around the upstream call.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        let forwarder = Forwarder::clone(&self.state.forwarder).with_pipeline(pipeline);
        self.state.forwarder = Arc::new(forwarder);
        self
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| request_span(request)))
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)));

        Router::new()
            .route(&self.config.forwarder.path, any(image_proxy_handler))
            .route("/healthz", get(handlers::liveness))
            .route("/readyz", get(handlers::readiness))
            .with_state(self.state.clone())
            .layer(middleware)
    }

    /// Shared readiness guard, so startup can warm it up in the background.
    pub fn readiness(&self) -> Arc<Readiness> {
        Arc::clone(&self.state.readiness)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin = %self.state.forwarder.origin(),
            path = %self.config.forwarder.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Image endpoint: `?url=<relative path>`.
///
/// A query string that cannot be decoded is treated like a missing `url`.
async fn image_proxy_handler(
    State(state): State<AppState>,
    query: Result<Query<ImageQuery>, QueryRejection>,
) -> Response {
    let start_time = Instant::now();

    let path = match &query {
        Ok(Query(params)) => params.url.as_deref(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unparseable query string");
            None
        }
    };

    let (outcome, response) = match state.forwarder.forward(path).await {
        Ok(image) => ("ok", image.into_response()),
        Err(e) => (e.outcome(), e.into_response()),
    };

    metrics::record_request(outcome, response.status().as_u16(), start_time);
    response
}
