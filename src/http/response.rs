//! Response handling.
//!
//! # Responsibilities
//! - Relay a fetched image with its content type and cache directive
//! - Map forwarding errors to status codes and JSON bodies
//! - Log server-side failure causes before they are replaced by a generic message

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::proxy::{ForwardError, ForwardedImage};

/// Cache directive attached to every relayed image: one year, immutable.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// JSON error payload: `{"error": "..."}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

impl ErrorBody {
    pub fn new(error: &'static str) -> Self {
        Self { error }
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl IntoResponse for ForwardedImage {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, self.content_type),
                (
                    header::CACHE_CONTROL,
                    HeaderValue::from_static(IMMUTABLE_CACHE_CONTROL),
                ),
            ],
            self.body,
        )
            .into_response()
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ForwardError::MissingUrl => {
                tracing::debug!("Rejected request without image url");
            }
            ForwardError::UpstreamStatus(upstream) => {
                tracing::warn!(status = %upstream, "Upstream returned non-success status");
            }
            _ => {
                tracing::error!(
                    outcome = self.outcome(),
                    error = %error_chain(&self),
                    "Proxy error"
                );
            }
        }
        (status, ErrorBody::new(self.public_message())).into_response()
    }
}

/// `err: cause: cause` for logs.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !chain.ends_with(&cause_text) {
            chain.push_str(": ");
            chain.push_str(&cause_text);
        }
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Bytes};
    use axum::http::StatusCode;

    async fn body_of(response: Response) -> Bytes {
        to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn test_image_response() {
        let image = ForwardedImage {
            content_type: HeaderValue::from_static("image/jpeg"),
            body: Bytes::from_static(b"\xff\xd8jpeg"),
        };
        let response = image.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=31536000, immutable"
        );
        assert_eq!(&body_of(response).await[..], b"\xff\xd8jpeg");
    }

    #[tokio::test]
    async fn test_error_bodies() {
        let cases = [
            (ForwardError::MissingUrl, 400, r#"{"error":"Image URL is required"}"#),
            (
                ForwardError::UpstreamStatus(StatusCode::NOT_FOUND),
                404,
                r#"{"error":"Failed to fetch image"}"#,
            ),
            (
                ForwardError::Transport("connection refused".into()),
                500,
                r#"{"error":"Internal Server Error"}"#,
            ),
        ];

        for (err, status, body) in cases {
            let response = err.into_response();
            assert_eq!(response.status().as_u16(), status);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
            assert_eq!(&body_of(response).await[..], body.as_bytes());
        }
    }

    #[test]
    fn test_error_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ForwardError::Transport(Box::new(io));
        assert_eq!(error_chain(&err), "upstream transport error: refused");
    }
}
