//! Process lifecycle: configuration resolution at startup, signal handling
//! and graceful shutdown.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{resolve_config, Overrides};
