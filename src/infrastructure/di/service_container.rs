//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::application::services::{BomService, RoutingService, TreeRenderer};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::http::HttpBomSource;
use crate::infrastructure::traits::{BomSource, FileBomSource, FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Where BOM documents come from
    pub source: Arc<dyn BomSource>,
}

impl ServiceContainer {
    /// Create a new service container with the HTTP BOM source.
    pub fn new(settings: Settings) -> ApplicationResult<Self> {
        let base_url = settings.base_url()?;
        let source = HttpBomSource::new(base_url, settings.request_timeout())?;
        debug!("BOM source: {}", source.describe());
        Ok(Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(source),
        ))
    }

    /// Create a service container reading BOM documents from a local file.
    pub fn from_file(settings: Settings, path: impl Into<PathBuf>) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(FileBomSource::new(path)),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        source: Arc<dyn BomSource>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            source,
        }
    }

    pub fn bom_service(&self) -> BomService {
        BomService::new(Arc::clone(&self.source))
    }

    pub fn renderer(&self) -> TreeRenderer {
        TreeRenderer::new(self.bom_service(), self.settings.canvas)
    }

    pub fn routing_service(&self) -> RoutingService {
        RoutingService::new(Arc::clone(&self.source))
    }
}
