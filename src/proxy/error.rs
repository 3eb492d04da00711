//! Forwarding error taxonomy.

use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

/// Boxed error used for causes that come from behind the [`Upstream`](crate::upstream::Upstream) seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const MISSING_URL_MESSAGE: &str = "Image URL is required";
pub const UPSTREAM_STATUS_MESSAGE: &str = "Failed to fetch image";
pub const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Everything that can end a forwarded request early.
///
/// Only [`ForwardError::MissingUrl`] and [`ForwardError::UpstreamStatus`]
/// are visible to the caller as-is; every other variant is reported as a
/// generic 500 and its cause is only logged.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The `url` query parameter is absent or empty.
    #[error("image url parameter missing")]
    MissingUrl,

    /// The upstream answered with a non-2xx status.
    #[error("upstream responded with {0}")]
    UpstreamStatus(StatusCode),

    /// `<origin>/<path>` cannot be turned into a request URI even after
    /// percent-encoding.
    #[error("invalid upstream target `{target}`: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: BoxError,
    },

    /// DNS, connect, TLS or protocol failure talking to the upstream.
    #[error("upstream transport error: {0}")]
    Transport(#[source] BoxError),

    /// The upstream exchange did not finish within the deadline.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// The upstream body could not be read or exceeded the size limit.
    #[error("failed to read upstream body: {0}")]
    Body(#[source] axum::Error),

    /// An interceptor refused to let the exchange continue.
    #[error("rejected by interceptor: {0}")]
    Rejected(String),
}

impl ForwardError {
    /// Status code sent to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl => StatusCode::BAD_REQUEST,
            Self::UpstreamStatus(status) => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `error` field of the response body.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingUrl => MISSING_URL_MESSAGE,
            Self::UpstreamStatus(_) => UPSTREAM_STATUS_MESSAGE,
            _ => INTERNAL_MESSAGE,
        }
    }

    /// Whether this is a server-side fault that warrants an error log.
    pub fn is_internal(&self) -> bool {
        self.status() == StatusCode::INTERNAL_SERVER_ERROR
            && !matches!(self, Self::UpstreamStatus(_))
    }

    /// Low-cardinality label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::MissingUrl => "missing_url",
            Self::UpstreamStatus(_) => "upstream_status",
            Self::InvalidTarget { .. } => "invalid_target",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::Body(_) => "body",
            Self::Rejected(_) => "rejected",
        }
    }
}
