//! Client for the photo gateway HTTP API.

pub mod client;

pub use client::{ClientError, GatewayClient, PhotoResult};
