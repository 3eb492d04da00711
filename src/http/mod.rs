//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, span, query extraction)
//!     → proxy::Forwarder (validate, fetch, relay)
//!     → response.rs (image + cache headers, or JSON error)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{ImageQuery, MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use response::{ErrorBody, IMMUTABLE_CACHE_CONTROL};
pub use server::{AppState, HttpServer};
