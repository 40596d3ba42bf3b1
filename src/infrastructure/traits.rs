//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with in-memory implementations.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Complexity;
use crate::infrastructure::svg::Element;

/// Failure to retrieve a document from a BOM source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error requesting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

/// Source of BOM documents (raw JSON bodies).
#[async_trait]
pub trait BomSource: Send + Sync {
    /// Fetch the BOM tree document for a complexity.
    async fn fetch_tree(&self, complexity: &Complexity) -> Result<String, FetchError>;

    /// Fetch the routing report document for a complexity.
    async fn fetch_routing(&self, complexity: &Complexity) -> Result<String, FetchError>;

    /// Human readable origin, for logs and messages.
    fn describe(&self) -> String;
}

/// Rendering target a diagram is drawn into.
///
/// Passed explicitly to every draw; a draw starts with `clear`.
pub trait Surface {
    /// Remove all previously drawn content.
    fn clear(&mut self);

    /// Set the drawing size in pixels.
    fn set_size(&mut self, width: f64, height: f64);

    /// Append a top-level element.
    fn append(&mut self, element: Element);
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// BOM source backed by a local JSON file.
///
/// Serves the same document for every complexity and both endpoints.
#[derive(Debug, Clone)]
pub struct FileBomSource {
    path: PathBuf,
}

impl FileBomSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<String, FetchError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::Read {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl BomSource for FileBomSource {
    async fn fetch_tree(&self, _complexity: &Complexity) -> Result<String, FetchError> {
        self.read().await
    }

    async fn fetch_routing(&self, _complexity: &Complexity) -> Result<String, FetchError> {
        self.read().await
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
