//! Logging setup and log-safe rendering of request payloads.

mod logging;

pub use logging::{init_logging, redact_sensitive, LogConfig, LogLevel};
