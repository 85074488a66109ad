//! On-disk authoritative copy of the catalog
//!
//! One JSON document plus a directory of uploaded images. This is the
//! fast-path copy every request reads and the copy whose write must succeed
//! for a save to count; the mirrors only ever receive best-effort copies of
//! these same bytes.

use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::CatalogConfig;

/// Name of the image directory under the data dir, and its relative path on
/// the mirrors. Fixed so stored `/uploads/...` references never go stale.
pub const UPLOAD_DIR_NAME: &str = "uploads";

pub struct LocalCache {
    catalog_path: PathBuf,
    catalog_file: String,
    upload_dir: PathBuf,
}

impl LocalCache {
    /// Create the cache, making the data and upload directories if needed.
    pub fn new(config: &CatalogConfig) -> io::Result<Self> {
        let data_dir = PathBuf::from(&config.data_dir);
        let upload_dir = data_dir.join(UPLOAD_DIR_NAME);
        if !upload_dir.exists() {
            fs::create_dir_all(&upload_dir)?;
            info!("Created data directory at {}", data_dir.display());
        }
        Ok(Self {
            catalog_path: data_dir.join(&config.catalog_file),
            catalog_file: config.catalog_file.clone(),
            upload_dir,
        })
    }

    /// File name of the catalog document, which is also its path on the mirrors.
    pub fn catalog_rel_path(&self) -> &str {
        &self.catalog_file
    }

    /// Mirror-relative path for an uploaded image.
    pub fn image_rel_path(&self, file_name: &str) -> String {
        format!("{}/{}", UPLOAD_DIR_NAME, file_name)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn catalog_exists(&self) -> bool {
        self.catalog_path.exists()
    }

    pub fn read_catalog(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.catalog_path)
    }

    pub fn write_catalog(&self, bytes: &[u8]) -> io::Result<()> {
        fs::write(&self.catalog_path, bytes)
    }

    fn image_path(&self, file_name: &str) -> PathBuf {
        // file_name is a bare name by construction; keep only the final
        // component anyway so a hostile catalog document cannot escape the
        // upload directory
        let name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        self.upload_dir.join(name)
    }

    pub fn has_image(&self, file_name: &str) -> bool {
        self.image_path(file_name).exists()
    }

    pub fn write_image(&self, file_name: &str, bytes: &[u8]) -> io::Result<()> {
        fs::write(self.image_path(file_name), bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache(dir: &TempDir) -> LocalCache {
        LocalCache::new(&CatalogConfig {
            data_dir: dir.path().to_string_lossy().to_string(),
            catalog_file: "products.json".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_creates_directories() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        assert!(cache.upload_dir().exists());
        assert!(!cache.catalog_exists());
    }

    #[test]
    fn test_catalog_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        cache.write_catalog(b"[]").unwrap();
        assert!(cache.catalog_exists());
        assert_eq!(cache.read_catalog().unwrap(), b"[]");
    }

    #[test]
    fn test_image_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        assert!(!cache.has_image("mug.png"));
        cache.write_image("mug.png", b"png-bytes").unwrap();
        assert!(cache.has_image("mug.png"));
    }

    #[test]
    fn test_image_path_ignores_directory_components() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        cache.write_image("../../escape.png", b"x").unwrap();
        // the file must land inside the upload dir, not above it
        assert!(cache.has_image("escape.png"));
        assert!(!dir.path().join("../../escape.png").exists());
    }

    #[test]
    fn test_rel_paths() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        assert_eq!(cache.catalog_rel_path(), "products.json");
        assert_eq!(cache.image_rel_path("mug.png"), "uploads/mug.png");
    }
}
