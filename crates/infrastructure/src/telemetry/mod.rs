//! Logging setup
//!
//! Installs the `tracing` subscriber used by binaries. Library code only
//! emits events; nothing here is required for interception to work.

mod logging;

pub use logging::{LoggingConfig, TelemetryError, init_logging};
