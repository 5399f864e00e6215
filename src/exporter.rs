//! Text artifact output.
//!
//! Persists the final snapshot as UTF-8 plain text, entries newline-joined in
//! collection order. A comment containing its own newline is written as-is
//! and reads back as multiple entries; that ambiguity is part of the format.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

/// Errors surfaced while writing the artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes collected comments to a plain-text file.
#[derive(Debug, Clone)]
pub struct TextExporter {
    path: PathBuf,
}

impl TextExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the comments newline-joined, in the order given.
    pub async fn export(&self, comments: &[String]) -> Result<(), ExportError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|source| {
                    ExportError::Io {
                        path: self.path.clone(),
                        source,
                    }
                })?;
            }
        }

        fs::write(&self.path, comments.join("\n"))
            .await
            .map_err(|source| ExportError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
