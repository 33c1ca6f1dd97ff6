//! Security subsystem.
//!
//! # Responsibilities
//! - CORS response headers (headers.rs)
//! - Path confinement for retrieval lives with storage (`job::storage`)
//!
//! # Design Decisions
//! - No authentication or rate limiting; the gateway is meant for a
//!   trusted network and output names are unguessable UUIDs

pub mod headers;
