//! Remote Mirror Abstraction
//!
//! This module provides an abstraction over remote blob-store backends,
//! allowing the sync engine to mirror the catalog document and uploaded images
//! to different providers (a source-control repository, a hosted space) without
//! affecting higher-level services.
//!
//! All mirror calls are best-effort: a failure is reported as a `MirrorError`
//! value and the caller decides whether it matters. The sync boundary logs and
//! swallows these errors, so API consumers never observe a mirror outage.

pub mod github_store;
pub mod mock_store;
pub mod space_store;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure while talking to a remote mirror. Always non-fatal to requests.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("mirror unavailable: {0}")]
    Unavailable(String),
}

/// A file as stored on a remote mirror.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub content: Vec<u8>,
    /// Opaque version token identifying the current revision of the file
    /// (GitHub blob sha, Space commit id). Required for safe update-in-place;
    /// `None` means the backend did not report one.
    pub revision: Option<String>,
}

/// Trait defining the remote blob-store interface
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name used in log lines
    fn label(&self) -> &str;

    /// Fetch a file by repository-relative path. A missing path is `Ok(None)`,
    /// not an error.
    async fn get(&self, path: &str) -> Result<Option<RemoteFile>, MirrorError>;

    /// Write a file at a repository-relative path with a commit message.
    /// Implementations must fetch the current version token first so an update
    /// does not clobber concurrent writers; with no token the call degrades to
    /// create semantics.
    async fn put(&self, path: &str, content: &[u8], message: &str) -> Result<(), MirrorError>;
}

/// Shared HTTP client for all mirror backends. Remote calls carry a bounded
/// timeout; a timeout is a push failure, not a process failure.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, MirrorError> {
    reqwest::Client::builder()
        .user_agent(concat!("storefront/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(MirrorError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_builds() {
        assert!(http_client(Duration::from_secs(15)).is_ok());
    }

    #[test]
    fn test_mirror_error_display() {
        let err = MirrorError::Status {
            status: reqwest::StatusCode::UNAUTHORIZED,
            url: "https://api.github.com/repos/acme/shop/contents/products.json".into(),
        };
        let message = err.to_string();
        assert!(message.contains("401"));
        assert!(message.contains("products.json"));
    }
}
