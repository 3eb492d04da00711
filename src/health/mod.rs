//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Liveness (handlers.rs):
//!     GET /healthz → "ok" while the process serves HTTP
//!
//! Readiness (readiness.rs):
//!     startup warm-up ─┐
//!     GET /readyz ─────┴→ one shared HEAD probe of the origin
//!                         → cached on success, retried on failure
//! ```

pub mod handlers;
pub mod readiness;

pub use readiness::Readiness;
