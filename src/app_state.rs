//! Application State Management
//!
//! This module provides the application state that contains all services and
//! their dependencies, following the dependency injection pattern: mirror
//! clients are constructed once from the configuration at process start and
//! passed into the sync engine by reference, never held as globals.

use log::info;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::mirror::github_store::GithubStore;
use crate::mirror::space_store::SpaceStore;
use crate::mirror::{self, BlobStore};
use crate::service::catalog_service::CatalogService;
use crate::service::upload_service::UploadService;
use crate::sync::local_cache::LocalCache;
use crate::sync::SyncEngine;

/// Application state containing all services and their dependencies
#[derive(Clone)]
pub struct AppState {
    pub catalog_service: Arc<CatalogService>,
    pub upload_service: Arc<UploadService>,
    /// Directory the static `/uploads` route serves from
    pub upload_dir: PathBuf,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> io::Result<Self> {
        info!("Initializing application state");

        let cache = LocalCache::new(&config.catalog)?;
        let upload_dir = cache.upload_dir().to_path_buf();

        let client = mirror::http_client(Duration::from_secs(config.mirrors.timeout_secs))
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("failed to build mirror HTTP client: {}", e),
                )
            })?;

        let source_mirror: Option<Arc<dyn BlobStore>> = match &config.mirrors.github {
            Some(github) => {
                info!("Mirroring to GitHub repo {} ({})", github.repo, github.branch);
                Some(Arc::new(GithubStore::new(github, client.clone())))
            }
            None => {
                info!("No GitHub mirror configured");
                None
            }
        };
        let space_mirror: Option<Arc<dyn BlobStore>> = match &config.mirrors.space {
            Some(space) => {
                info!("Mirroring to Space {} ({})", space.repo_id, space.branch);
                Some(Arc::new(SpaceStore::new(space, client)))
            }
            None => {
                info!("No Space mirror configured");
                None
            }
        };

        let sync = Arc::new(SyncEngine::new(cache, source_mirror, space_mirror));
        Ok(Self {
            catalog_service: Arc::new(CatalogService::new(sync.clone())),
            upload_service: Arc::new(UploadService::new(sync)),
            upload_dir,
            config,
        })
    }

    /// Create application state for testing: mock mirrors, catalog under the
    /// given directory. Returns the mocks so tests can inspect and fail them.
    pub fn for_testing(
        data_dir: &std::path::Path,
    ) -> (
        Self,
        Arc<crate::mirror::mock_store::MockBlobStore>,
        Arc<crate::mirror::mock_store::MockBlobStore>,
    ) {
        use crate::mirror::mock_store::MockBlobStore;

        let mut config = AppConfig::default();
        config.catalog.data_dir = data_dir.to_string_lossy().to_string();

        let cache = LocalCache::new(&config.catalog).expect("failed to create test cache");
        let upload_dir = cache.upload_dir().to_path_buf();

        let github = Arc::new(MockBlobStore::new("github"));
        let space = Arc::new(MockBlobStore::new("space"));
        let sync = Arc::new(SyncEngine::new(
            cache,
            Some(github.clone() as Arc<dyn BlobStore>),
            Some(space.clone() as Arc<dyn BlobStore>),
        ));

        let state = Self {
            catalog_service: Arc::new(CatalogService::new(sync.clone())),
            upload_service: Arc::new(UploadService::new(sync)),
            upload_dir,
            config,
        };
        (state, github, space)
    }
}
