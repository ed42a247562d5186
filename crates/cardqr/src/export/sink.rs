//! Destinations for exported files.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::info;

use crate::error::{Error, Result};

/// A file handed to a [`SaveSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// File name including extension.
    pub file_name: String,
    /// MIME type of the contents.
    pub mime: String,
    /// Where the file ended up.
    pub location: PathBuf,
    /// Size in bytes.
    pub size: usize,
}

/// Receives exported files, the way a browser receives a download.
pub trait SaveSink: Send + Sync + std::fmt::Debug {
    /// Persist `bytes` as `file_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be written.
    fn save(&self, file_name: &str, mime: &str, bytes: &[u8]) -> Result<SavedFile>;
}

/// Writes files into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create a sink rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveSink for DirectorySink {
    fn save(&self, file_name: &str, mime: &str, bytes: &[u8]) -> Result<SavedFile> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|source| Error::DirectoryCreate {
                path: self.dir.clone(),
                source,
            })?;
        }
        let location = self.dir.join(file_name);
        std::fs::write(&location, bytes)?;
        info!("Saved {} ({} bytes)", location.display(), bytes.len());

        Ok(SavedFile {
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            location,
            size: bytes.len(),
        })
    }
}

/// Keeps exported files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<(SavedFile, Vec<u8>)>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything saved so far, oldest first.
    #[must_use]
    pub fn files(&self) -> Vec<(SavedFile, Vec<u8>)> {
        self.files
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }
}

impl SaveSink for MemorySink {
    fn save(&self, file_name: &str, mime: &str, bytes: &[u8]) -> Result<SavedFile> {
        let saved = SavedFile {
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            location: PathBuf::from(file_name),
            size: bytes.len(),
        };
        self.files
            .lock()
            .map_err(|_| Error::internal("memory sink lock poisoned"))?
            .push((saved.clone(), bytes.to_vec()));
        Ok(saved)
    }
}
