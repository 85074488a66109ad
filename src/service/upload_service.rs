//! Image upload service
//!
//! Accepts a binary payload, gives it a collision-resistant name, writes it to
//! the local upload directory and pushes it to both mirrors best-effort. Only
//! a failed local write fails the upload.

use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::sync::{SyncEngine, UPLOAD_URL_PREFIX};

pub struct UploadService {
    sync: Arc<SyncEngine>,
}

impl UploadService {
    /// Create a new upload service with an injected sync engine
    pub fn new(sync: Arc<SyncEngine>) -> Self {
        Self { sync }
    }

    /// Store an uploaded image and return the `/uploads/...` reference to put
    /// in the product's `image` field.
    pub async fn store_image(&self, bytes: &[u8], original_name: &str) -> Result<String, ApiError> {
        let file_name = unique_file_name(original_name);

        self.sync.cache().write_image(&file_name, bytes)?;
        info!(
            "Stored uploaded image {} ({} bytes)",
            file_name,
            bytes.len()
        );

        let rel_path = self.sync.cache().image_rel_path(&file_name);
        self.sync
            .push_file(&rel_path, bytes, &format!("Upload {}", file_name))
            .await;

        Ok(format!("{}{}", UPLOAD_URL_PREFIX, file_name))
    }
}

/// Keep only the final path component and characters safe for a file name.
fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);
    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.trim_matches(['.', '_']).is_empty() {
        "image".to_string()
    } else {
        safe
    }
}

/// Prefix the sanitized name with a random token so concurrent uploads of the
/// same file never collide.
fn unique_file_name(original: &str) -> String {
    format!("{}_{}", Uuid::new_v4().simple(), sanitize_file_name(original))
}
