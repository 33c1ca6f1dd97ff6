//! Image worker subsystem.
//!
//! # Data Flow
//! ```text
//! Job (input path, output path, mode)
//!     → protocol.rs (validate + encode the command line)
//!     → bridge.rs (connect, send, read until close)
//!     → protocol.rs (translate first byte into a status)
//!     → WorkerReply
//! ```
//!
//! # Design Decisions
//! - One connection per job; the worker signals completion by closing
//! - Every failure mode has its own error variant
//! - The worker address is injected configuration, never a constant

pub mod bridge;
pub mod protocol;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use bridge::{BridgeState, WorkerBridge};
pub use protocol::{translate, Command, WorkerReply};

/// Errors from one worker exchange.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Worker refused or could not be reached.
    #[error("worker at {addr} unavailable: {source}")]
    Unavailable {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Connection was not established in time.
    #[error("worker at {addr} did not accept a connection within {after:?}")]
    ConnectTimeout { addr: String, after: Duration },

    /// Connected, but the worker did not finish within the deadline.
    #[error("worker did not close the connection within {after:?}")]
    Timeout { after: Duration },

    /// Connection broke while sending or receiving.
    #[error("worker connection failed mid-exchange: {0}")]
    Reset(#[source] std::io::Error),

    /// Worker closed without sending anything.
    #[error("worker closed the connection without a response")]
    EmptyResponse,

    /// Worker kept sending past the configured cap.
    #[error("worker response exceeded {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// A path would corrupt the command line.
    #[error("path {0:?} cannot be sent to the worker")]
    UnsafePath(PathBuf),
}
