//! Response bodies.
//!
//! # Responsibilities
//! - Shape the JSON verdict returned for a finished job
//! - Report gateway liveness
//!
//! Error bodies live with the error type (`crate::error`).

use serde::{Deserialize, Serialize};

use crate::job::OutputName;
use crate::worker::WorkerReply;

/// `{ "response": <status byte>, "output": "<name>" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoResult {
    /// Worker status byte as an integer.
    pub response: u8,
    /// Retrieval name of the processed photo.
    pub output: String,
}

impl PhotoResult {
    pub fn new(reply: &WorkerReply, output: &OutputName) -> Self {
        Self {
            response: reply.status,
            output: output.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
