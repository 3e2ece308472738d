//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events to stdout)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! The request handler additionally writes:
//!     → log_buffer.rs (bounded ring buffer, served at /logs)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID flows through every request span
//! - Metrics are cheap (atomic increments)
//! - The ring buffer is injected, never a global hook

pub mod log_buffer;
pub mod logging;
pub mod metrics;

pub use log_buffer::{LogBuffer, LogEntry};
