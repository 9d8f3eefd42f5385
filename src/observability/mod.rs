//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (locale, action, status)
//! - Request ID flows through all spans
//! - Metrics are cheap (atomic increments); recording is a no-op without an exporter

pub mod logging;
pub mod metrics;
