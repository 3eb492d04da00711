//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (enforce the exchange deadline)
//!     → On elapse: ForwardError::Timeout → 500
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries: every failure is terminal for the current request

pub mod timeouts;

pub use timeouts::with_deadline;
