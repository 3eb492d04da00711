//! Image forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! ?url=<relative path>
//!     → forwarder.rs (reject missing/empty)
//!     → target.rs (<origin>/<path>, verbatim)
//!     → upstream (single GET, no custom headers)
//!     → ForwardedImage | ForwardError (error.rs)
//! ```

pub mod error;
pub mod forwarder;
pub mod target;

pub use error::{BoxError, ForwardError};
pub use forwarder::{ForwardedImage, Forwarder, FALLBACK_CONTENT_TYPE};
pub use target::{Origin, OriginError};
