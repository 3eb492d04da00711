//! Image proxy library.
//!
//! Relays `GET <path>?url=<relative path>` to a fixed upstream origin and
//! returns the image with a long-lived cache directive.
//!
//! ```text
//!   client ──▶ http::server ──▶ proxy::Forwarder ──▶ upstream::Upstream ──▶ origin
//!          ◀── http::response ◀──────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod proxy;
pub mod upstream;

// Cross-cutting concerns
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::{ForwardError, Forwarder};
