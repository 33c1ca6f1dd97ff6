//! Writing uploads into the staging directory.
//!
//! Each upload lands in a file named by a fresh UUID, so concurrent uploads
//! never share a path. The file is flushed and closed before the job is
//! handed to the worker.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// A staging file still being written.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file: File,
    written: u64,
}

impl StagedFile {
    /// Create a new, uniquely named file under `dir`.
    pub async fn create(dir: &Path) -> std::io::Result<Self> {
        let path = dir.join(Uuid::new_v4().simple().to_string());
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush everything to disk and return the staged path.
    pub async fn finish(mut self) -> std::io::Result<PathBuf> {
        self.file.flush().await?;
        self.file.sync_data().await?;
        tracing::debug!(path = %self.path.display(), bytes = self.written, "Upload staged");
        Ok(self.path)
    }

    /// Remove a partially written file.
    pub async fn discard(self) {
        drop(self.file);
        remove_staged(&self.path).await;
    }
}

/// Delete a staged upload that will never reach the worker.
pub async fn remove_staged(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial upload");
    }
}
