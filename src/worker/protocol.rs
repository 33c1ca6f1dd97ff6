//! Worker wire protocol.
//!
//! Request: one unterminated line `<input>,<output>,<mode>`.
//! Response: raw bytes until the worker closes; the first byte is the status.

use std::path::Path;

use crate::worker::BridgeError;

/// Field separator on the command line. Never escaped.
pub const DELIMITER: char = ',';

/// A validated command line for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    input: String,
    output: String,
    mode: String,
}

impl Command {
    /// Build a command from absolute paths and an opaque mode.
    ///
    /// Paths must be absolute UTF-8 and free of the delimiter, newlines and
    /// NUL; otherwise the worker would split the line differently than we
    /// meant. The mode is passed through untouched.
    pub fn new(input: &Path, output: &Path, mode: impl Into<String>) -> Result<Self, BridgeError> {
        Ok(Self {
            input: checked_path(input)?,
            output: checked_path(output)?,
            mode: mode.into(),
        })
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Bytes written to the socket.
    pub fn encode(&self) -> Vec<u8> {
        format!("{}{d}{}{d}{}", self.input, self.output, self.mode, d = DELIMITER).into_bytes()
    }
}

fn checked_path(path: &Path) -> Result<String, BridgeError> {
    let unsafe_path = || BridgeError::UnsafePath(path.to_path_buf());

    if !path.is_absolute() {
        return Err(unsafe_path());
    }
    let text = path.to_str().ok_or_else(unsafe_path)?;
    if text.contains(DELIMITER) || text.contains('\n') || text.contains('\0') {
        return Err(unsafe_path());
    }
    Ok(text.to_string())
}

/// Decoded worker response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReply {
    /// First response byte, reported verbatim to the client.
    pub status: u8,
    /// Whatever followed the status byte. The reference worker sends a single
    /// NUL here; it is kept so richer replies can be surfaced later.
    pub trailer: Vec<u8>,
}

/// Turn a close-delimited worker response into a reply.
pub fn translate(raw: &[u8]) -> Result<WorkerReply, BridgeError> {
    match raw.split_first() {
        Some((&status, rest)) => Ok(WorkerReply {
            status,
            trailer: rest.to_vec(),
        }),
        None => Err(BridgeError::EmptyResponse),
    }
}
