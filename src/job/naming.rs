//! Output file names.
//!
//! A name is both the worker's output target and the public retrieval key,
//! so it must be unique across concurrent jobs and hard to guess. UUID v4
//! gives both without any shared state.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// `<uuid-v4>.<extension>`, e.g. `0f8c…e1.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OutputName(String);

impl OutputName {
    /// Generate a fresh name. Safe to call from any number of tasks at once.
    pub fn generate(extension: &str) -> Self {
        Self(format!("{}.{}", Uuid::new_v4(), extension))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OutputName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
