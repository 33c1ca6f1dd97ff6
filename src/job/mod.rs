//! Jobs: one uploaded photo on its way through the worker.
//!
//! # Data Flow
//! ```text
//! multipart upload
//!     → staging.rs (bytes written under upload_dir)
//!     → naming.rs (unique output name)
//!     → Job { input_path, output_path, mode }
//!     → worker bridge → WorkerReply
//! ```
//!
//! # Design Decisions
//! - A job lives for one HTTP request and holds no shared state
//! - Directories are partitioned by unique names, so no locking
//! - Storage paths are canonical before any command is built

pub mod naming;
pub mod staging;
pub mod storage;

use std::path::{Path, PathBuf};

pub use naming::OutputName;
pub use staging::StagedFile;
pub use storage::StorageLayout;

use crate::worker::{translate, BridgeError, Command, WorkerBridge, WorkerReply};

/// A single photo processing request.
#[derive(Debug, Clone)]
pub struct Job {
    input_path: PathBuf,
    output_path: PathBuf,
    output_name: OutputName,
    mode: String,
}

impl Job {
    /// Assign an output name for an already staged upload.
    pub fn new(layout: &StorageLayout, input_path: PathBuf, mode: String) -> Self {
        let output_name = layout.new_output_name();
        let output_path = layout.output_path(&output_name);
        Self {
            input_path,
            output_path,
            output_name,
            mode,
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn output_name(&self) -> &OutputName {
        &self.output_name
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Hand the job to the worker and decode its verdict.
    pub async fn process(&self, bridge: &WorkerBridge) -> Result<WorkerReply, BridgeError> {
        let command = Command::new(&self.input_path, &self.output_path, self.mode.as_str())?;
        let raw = bridge.exchange(&command).await?;
        let reply = translate(&raw)?;

        if !reply.trailer.is_empty() {
            tracing::debug!(
                output = %self.output_name,
                trailer_len = reply.trailer.len(),
                "Worker sent bytes after the status"
            );
        }
        Ok(reply)
    }
}
