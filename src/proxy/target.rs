//! Upstream origin and target construction.

use std::fmt;

use axum::http::Uri;
use url::Url;

use crate::proxy::error::ForwardError;

/// Why a configured origin was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OriginError {
    #[error("`{0}` is not a valid URL: {1}")]
    Malformed(String, url::ParseError),

    #[error("scheme `{0}` is not supported, use http")]
    UnsupportedScheme(String),

    #[error("`{0}` has no host")]
    MissingHost(String),

    #[error("`{0}` must not carry a query or fragment")]
    HasQuery(String),
}

/// The fixed upstream base URL.
///
/// Stored without a trailing `/` so that joining always inserts exactly one
/// separator between the origin and the relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin(String);

impl Origin {
    /// Validate and normalize a configured origin.
    pub fn parse(raw: &str) -> Result<Self, OriginError> {
        let raw = raw.trim();
        let url = Url::parse(raw).map_err(|e| OriginError::Malformed(raw.to_string(), e))?;

        if url.scheme() != "http" {
            return Err(OriginError::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(OriginError::MissingHost(raw.to_string()));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(OriginError::HasQuery(raw.to_string()));
        }

        Ok(Self(raw.trim_end_matches('/').to_string()))
    }

    /// Build `<origin>/<path>`.
    ///
    /// The path is appended as-is and then parsed the way a WHATWG URL
    /// parser does: characters outside the path and query sets (spaces,
    /// quotes, angle brackets, non-ASCII) are percent-encoded, existing
    /// `%XX` escapes are kept and dot segments are resolved.
    pub fn join(&self, path: &str) -> Result<Uri, ForwardError> {
        let target = format!("{}/{}", self.0, path);
        let url = match Url::parse(&target) {
            Ok(url) => url,
            Err(source) => {
                return Err(ForwardError::InvalidTarget {
                    target,
                    source: Box::new(source),
                })
            }
        };
        to_uri(url).map_err(|source| ForwardError::InvalidTarget {
            target,
            source: Box::new(source),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert a parsed URL into a request URI. The fragment is never sent.
pub(crate) fn to_uri(mut url: Url) -> Result<Uri, axum::http::uri::InvalidUri> {
    url.set_fragment(None);
    url.as_str().parse()
}
