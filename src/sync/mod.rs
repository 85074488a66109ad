//! Sync Engine
//!
//! Orchestrates the three copies of the catalog: the local JSON file
//! (authoritative for writes), the source-control mirror (authoritative for
//! reads when configured) and the hosted-space mirror (write-only). Loads
//! prefer the source-control mirror and fall back to the local file; saves
//! write locally first and then push to both mirrors best-effort. Mirror
//! outcomes only ever reach the logs, never the request result.

pub mod local_cache;

use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::ApiError;
use crate::mirror::BlobStore;
use crate::model::Product;
use local_cache::LocalCache;

/// URL prefix under which uploaded images are served; products whose `image`
/// starts with this refer to files in the managed upload directory.
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

pub struct SyncEngine {
    cache: LocalCache,
    /// Source-control mirror, preferred source for reads
    source_mirror: Option<Arc<dyn BlobStore>>,
    /// Hosted-space mirror, receives pushes only
    space_mirror: Option<Arc<dyn BlobStore>>,
}

impl SyncEngine {
    pub fn new(
        cache: LocalCache,
        source_mirror: Option<Arc<dyn BlobStore>>,
        space_mirror: Option<Arc<dyn BlobStore>>,
    ) -> Self {
        Self {
            cache,
            source_mirror,
            space_mirror,
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Load the current catalog. Never fails: remote problems fall back to the
    /// local file, and a missing or unreadable local file yields an empty
    /// catalog.
    pub async fn load_catalog(&self) -> Vec<Product> {
        if let Some(mirror) = &self.source_mirror {
            match mirror.get(self.cache.catalog_rel_path()).await {
                Ok(Some(file)) => match serde_json::from_slice::<Vec<Product>>(&file.content) {
                    Ok(products) => {
                        debug!(
                            "Loaded {} products from {} (revision {:?})",
                            products.len(),
                            mirror.label(),
                            file.revision
                        );
                        // Refresh the local fallback copy with what the mirror
                        // returned; losing this write only costs freshness.
                        if let Err(e) = self.cache.write_catalog(&file.content) {
                            warn!("Failed to refresh local catalog copy: {}", e);
                        }
                        self.restore_missing_images(&products, mirror).await;
                        return products;
                    }
                    Err(e) => {
                        warn!(
                            "Catalog on {} is not valid JSON, falling back to local copy: {}",
                            mirror.label(),
                            e
                        );
                    }
                },
                Ok(None) => {
                    debug!("No catalog on {} yet, using local copy", mirror.label());
                }
                Err(e) => {
                    warn!(
                        "Failed to fetch catalog from {}, falling back to local copy: {}",
                        mirror.label(),
                        e
                    );
                }
            }
        }
        self.load_local()
    }

    fn load_local(&self) -> Vec<Product> {
        if !self.cache.catalog_exists() {
            return Vec::new();
        }
        match self.cache.read_catalog() {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(products) => products,
                Err(e) => {
                    warn!("Local catalog file is not valid JSON: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Failed to read local catalog file: {}", e);
                Vec::new()
            }
        }
    }

    /// Persist the catalog. The local write must succeed or the whole save
    /// fails; the mirror pushes afterwards are best-effort and do not affect
    /// the result.
    pub async fn save_catalog(&self, products: &[Product]) -> Result<(), ApiError> {
        let bytes = serde_json::to_vec_pretty(products)
            .map_err(|e| ApiError::Internal(format!("failed to serialize catalog: {}", e)))?;
        self.cache.write_catalog(&bytes)?;
        debug!("Wrote {} products to local catalog file", products.len());

        self.push_file(self.cache.catalog_rel_path(), &bytes, "Update products.json")
            .await;
        Ok(())
    }

    /// Push one file to every configured mirror, best-effort. Used for the
    /// catalog document and for uploaded images.
    pub async fn push_file(&self, rel_path: &str, bytes: &[u8], message: &str) {
        for mirror in [&self.source_mirror, &self.space_mirror]
            .into_iter()
            .flatten()
        {
            match mirror.put(rel_path, bytes, message).await {
                Ok(()) => info!("Pushed {} to {}", rel_path, mirror.label()),
                Err(e) => warn!("Failed to push {} to {}: {}", rel_path, mirror.label(), e),
            }
        }
    }

    /// Rehydrate locally-missing image files referenced by the catalog from
    /// the source-control mirror. A per-image failure leaves that image
    /// unavailable locally and moves on.
    async fn restore_missing_images(&self, products: &[Product], mirror: &Arc<dyn BlobStore>) {
        for product in products {
            let Some(name) = product.image.strip_prefix(UPLOAD_URL_PREFIX) else {
                continue;
            };
            if name.is_empty() || self.cache.has_image(name) {
                continue;
            }
            match mirror.get(&self.cache.image_rel_path(name)).await {
                Ok(Some(file)) => match self.cache.write_image(name, &file.content) {
                    Ok(()) => info!("Restored missing image {} from {}", name, mirror.label()),
                    Err(e) => warn!("Failed to write restored image {}: {}", name, e),
                },
                Ok(None) => warn!(
                    "Image {} referenced by product {} not found on {}",
                    name,
                    product.id,
                    mirror.label()
                ),
                Err(e) => warn!(
                    "Failed to fetch image {} from {}: {}",
                    name,
                    mirror.label(),
                    e
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::mirror::mock_store::MockBlobStore;
    use crate::model::{Product, ProductInput};
    use tempfile::TempDir;

    fn catalog_config(dir: &TempDir) -> CatalogConfig {
        CatalogConfig {
            data_dir: dir.path().to_string_lossy().to_string(),
            catalog_file: "products.json".to_string(),
        }
    }

    fn engine_with_mirrors(
        dir: &TempDir,
    ) -> (SyncEngine, Arc<MockBlobStore>, Arc<MockBlobStore>) {
        let github = Arc::new(MockBlobStore::new("github"));
        let space = Arc::new(MockBlobStore::new("space"));
        let cache = LocalCache::new(&catalog_config(dir)).unwrap();
        let engine = SyncEngine::new(
            cache,
            Some(github.clone() as Arc<dyn BlobStore>),
            Some(space.clone() as Arc<dyn BlobStore>),
        );
        (engine, github, space)
    }

    fn engine_local_only(dir: &TempDir) -> SyncEngine {
        let cache = LocalCache::new(&catalog_config(dir)).unwrap();
        SyncEngine::new(cache, None, None)
    }

    fn product(id: u64, name: &str, image: &str) -> Product {
        let mut p = Product::from_input(
            id,
            ProductInput {
                name: Some(name.to_string()),
                price: Some("9.99".to_string()),
                ..Default::default()
            },
        );
        if !image.is_empty() {
            p.image = image.to_string();
        }
        p
    }

    #[actix_web::test]
    async fn test_load_empty_when_nothing_exists() {
        let dir = TempDir::new().unwrap();
        let engine = engine_local_only(&dir);
        assert!(engine.load_catalog().await.is_empty());
    }

    #[actix_web::test]
    async fn test_local_round_trip_without_mirrors() {
        let dir = TempDir::new().unwrap();
        let engine = engine_local_only(&dir);

        let products = vec![product(1, "Mug", ""), product(2, "Cup", "")];
        engine.save_catalog(&products).await.unwrap();
        assert_eq!(engine.load_catalog().await, products);
    }

    #[actix_web::test]
    async fn test_save_pushes_to_both_mirrors() {
        let dir = TempDir::new().unwrap();
        let (engine, github, space) = engine_with_mirrors(&dir);

        let products = vec![product(1, "Mug", "")];
        engine.save_catalog(&products).await.unwrap();

        for mirror in [&github, &space] {
            let pushed = mirror.content_of("products.json").unwrap();
            let parsed: Vec<Product> = serde_json::from_slice(&pushed).unwrap();
            assert_eq!(parsed, products);
        }
    }

    #[actix_web::test]
    async fn test_save_fails_when_local_write_fails() {
        let dir = TempDir::new().unwrap();
        let (engine, github, _space) = engine_with_mirrors(&dir);

        // a directory squatting on the catalog path makes the local write fail
        std::fs::create_dir(dir.path().join("products.json")).unwrap();

        let err = engine
            .save_catalog(&[product(1, "Mug", "")])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));
        // nothing was pushed: the local write is the gate
        assert_eq!(github.file_count(), 0);
    }

    #[actix_web::test]
    async fn test_save_succeeds_when_mirrors_offline() {
        let dir = TempDir::new().unwrap();
        let (engine, github, space) = engine_with_mirrors(&dir);
        github.set_offline(true);
        space.set_offline(true);

        let products = vec![product(1, "Mug", "")];
        engine.save_catalog(&products).await.unwrap();

        assert_eq!(github.file_count(), 0);
        assert_eq!(space.file_count(), 0);
        // local copy still written
        assert!(engine.cache().catalog_exists());
    }

    #[actix_web::test]
    async fn test_load_prefers_source_mirror() {
        let dir = TempDir::new().unwrap();
        let (engine, github, _space) = engine_with_mirrors(&dir);

        // stale local copy, newer remote copy
        let local = vec![product(1, "Old Mug", "")];
        engine
            .cache()
            .write_catalog(&serde_json::to_vec(&local).unwrap())
            .unwrap();
        let remote = vec![product(1, "New Mug", ""), product(2, "Cup", "")];
        github.insert("products.json", &serde_json::to_vec(&remote).unwrap());

        let loaded = engine.load_catalog().await;
        assert_eq!(loaded, remote);
        // local fallback copy refreshed from the mirror
        let refreshed: Vec<Product> =
            serde_json::from_slice(&engine.cache().read_catalog().unwrap()).unwrap();
        assert_eq!(refreshed, remote);
    }

    #[actix_web::test]
    async fn test_load_falls_back_to_local_when_mirror_unreachable() {
        let dir = TempDir::new().unwrap();
        let (engine, github, space) = engine_with_mirrors(&dir);

        let products = vec![product(1, "Mug", "")];
        engine.save_catalog(&products).await.unwrap();

        github.set_offline(true);
        space.set_offline(true);
        let loaded = engine.load_catalog().await;
        assert_eq!(loaded, products); // local content, unchanged, not empty
    }

    #[actix_web::test]
    async fn test_load_falls_back_on_corrupt_remote_catalog() {
        let dir = TempDir::new().unwrap();
        let (engine, github, _space) = engine_with_mirrors(&dir);

        let products = vec![product(1, "Mug", "")];
        engine
            .cache()
            .write_catalog(&serde_json::to_vec(&products).unwrap())
            .unwrap();
        github.insert("products.json", b"{not json");

        assert_eq!(engine.load_catalog().await, products);
    }

    #[actix_web::test]
    async fn test_load_restores_missing_images() {
        let dir = TempDir::new().unwrap();
        let (engine, github, _space) = engine_with_mirrors(&dir);

        let products = vec![product(1, "Mug", "/uploads/mug.png")];
        github.insert("products.json", &serde_json::to_vec(&products).unwrap());
        github.insert("uploads/mug.png", b"png-bytes");
        assert!(!engine.cache().has_image("mug.png"));

        let loaded = engine.load_catalog().await;
        // product data is untouched, the image materializes as a side effect
        assert_eq!(loaded, products);
        assert!(engine.cache().has_image("mug.png"));
    }

    #[actix_web::test]
    async fn test_missing_remote_image_does_not_abort_load() {
        let dir = TempDir::new().unwrap();
        let (engine, github, _space) = engine_with_mirrors(&dir);

        let products = vec![
            product(1, "Mug", "/uploads/gone.png"),
            product(2, "Cup", "https://example.com/cup.png"),
        ];
        github.insert("products.json", &serde_json::to_vec(&products).unwrap());

        let loaded = engine.load_catalog().await;
        assert_eq!(loaded, products);
        assert!(!engine.cache().has_image("gone.png"));
    }

    #[actix_web::test]
    async fn test_reload_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (engine, github, _space) = engine_with_mirrors(&dir);

        let products = vec![product(1, "Mug", "/uploads/mug.png")];
        github.insert("products.json", &serde_json::to_vec(&products).unwrap());
        github.insert("uploads/mug.png", b"png-bytes");

        let first = engine.load_catalog().await;
        let second = engine.load_catalog().await;
        assert_eq!(first, second);
    }
}
