//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Job to worker:
//!     → timeouts.rs (connect deadline, then send+receive deadline)
//!     → On expiry: the connection is dropped and the job fails
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: a worker call is not assumed idempotent

pub mod timeouts;

pub use timeouts::{Deadline, DeadlineExceeded};
