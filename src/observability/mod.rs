//! Observability for mycelium
//!
//! Structured, synchronous, one-line-per-event logging. Logs go to stderr so
//! they never interleave with record content written to stdout.

mod logger;

pub use logger::{Logger, Severity, LOG_LEVEL_ENV};
