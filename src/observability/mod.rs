//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and the worker bridge produce:
//!     → logging.rs (structured log events, request-id spans)
//!     → metrics.rs (job/retrieval counters, job latency)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Metric labels are bounded (outcome kinds only, never the mode)

pub mod logging;
pub mod metrics;
