//! Staging/output directory layout and output name resolution.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::StorageConfig;
use crate::job::naming::OutputName;
use crate::worker::protocol::DELIMITER;

/// Canonical, absolute directories shared with the worker.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    upload_dir: PathBuf,
    output_dir: PathBuf,
    output_extension: String,
}

impl StorageLayout {
    /// Create both directories if needed and pin them to absolute paths.
    pub fn prepare(config: &StorageConfig) -> io::Result<Self> {
        let upload_dir = ensure_dir(&config.upload_dir)?;
        let output_dir = ensure_dir(&config.output_dir)?;

        tracing::info!(
            upload_dir = %upload_dir.display(),
            output_dir = %output_dir.display(),
            "Storage directories ready"
        );

        Ok(Self {
            upload_dir,
            output_dir,
            output_extension: config.output_extension.clone(),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fresh output name with the configured extension.
    pub fn new_output_name(&self) -> OutputName {
        OutputName::generate(&self.output_extension)
    }

    /// Absolute path the worker should write `name` to.
    pub fn output_path(&self, name: &OutputName) -> PathBuf {
        self.output_dir.join(name.as_str())
    }

    /// Map a client-supplied name to an existing file inside the output dir.
    ///
    /// Returns `None` for anything that is not a single plain file name, for
    /// files that do not exist, and for paths that escape the directory
    /// after symlink resolution.
    pub async fn resolve_output(&self, name: &str) -> Option<PathBuf> {
        if !is_plain_file_name(name) {
            return None;
        }

        let resolved = tokio::fs::canonicalize(self.output_dir.join(name)).await.ok()?;
        if !resolved.starts_with(&self.output_dir) {
            tracing::warn!(name, resolved = %resolved.display(), "Output name escapes output directory");
            return None;
        }

        let metadata = tokio::fs::metadata(&resolved).await.ok()?;
        metadata.is_file().then_some(resolved)
    }
}

fn ensure_dir(dir: &Path) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let canonical = std::fs::canonicalize(dir)?;
    if canonical.to_string_lossy().contains(DELIMITER) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "{} contains '{}' and cannot be sent to the worker",
                canonical.display(),
                DELIMITER
            ),
        ));
    }
    Ok(canonical)
}

/// True when `name` is exactly one normal path component with no hidden
/// prefix or separator of any platform.
pub fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') {
        return false;
    }
    if name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
