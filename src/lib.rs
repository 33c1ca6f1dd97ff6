//! Photo gateway library.
//!
//! Accepts photo uploads over HTTP, hands each one to an external image
//! worker over a one-shot TCP line protocol, and serves the processed
//! results back by name.

pub mod config;
pub mod error;
pub mod http;
pub mod job;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod worker;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
