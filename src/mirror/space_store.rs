//! Hugging Face Space mirror backend
//!
//! Reads go through the hub's raw `resolve` endpoint; writes go through the
//! NDJSON commit endpoint, which accepts a commit header line followed by one
//! line per file with base64 content. The hub assigns commit ids itself, so
//! `put` does not need a version token here; the `x-repo-commit` header from
//! `get` is still surfaced as the revision for observability.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;
use reqwest::{header, StatusCode};
use serde_json::json;

use crate::config::SpaceConfig;
use crate::mirror::{BlobStore, MirrorError, RemoteFile};

const HUB_ROOT: &str = "https://huggingface.co";

pub struct SpaceStore {
    client: reqwest::Client,
    /// "owner/space-name"
    repo_id: String,
    branch: String,
    token: String,
}

impl SpaceStore {
    pub fn new(config: &SpaceConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            repo_id: config.repo_id.clone(),
            branch: config.branch.clone(),
            token: config.token.clone(),
        }
    }

    fn resolve_url(&self, path: &str) -> String {
        format!(
            "{}/spaces/{}/resolve/{}/{}",
            HUB_ROOT, self.repo_id, self.branch, path
        )
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/api/spaces/{}/commit/{}",
            HUB_ROOT, self.repo_id, self.branch
        )
    }
}

/// Build the NDJSON commit payload: one header line, one file line.
fn commit_payload(path: &str, content: &[u8], message: &str) -> String {
    let header = json!({
        "key": "header",
        "value": { "summary": message }
    });
    let file = json!({
        "key": "file",
        "value": {
            "path": path,
            "content": BASE64.encode(content),
            "encoding": "base64"
        }
    });
    format!("{}\n{}", header, file)
}

#[async_trait]
impl BlobStore for SpaceStore {
    fn label(&self) -> &str {
        "space"
    }

    async fn get(&self, path: &str) -> Result<Option<RemoteFile>, MirrorError> {
        let url = self.resolve_url(path);
        debug!("Space GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(MirrorError::Status {
                status: response.status(),
                url,
            });
        }

        let revision = response
            .headers()
            .get("x-repo-commit")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let content = response.bytes().await?.to_vec();

        Ok(Some(RemoteFile { content, revision }))
    }

    async fn put(&self, path: &str, content: &[u8], message: &str) -> Result<(), MirrorError> {
        let url = self.commit_url();
        debug!("Space commit {} ({} bytes to {})", url, content.len(), path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(header::CONTENT_TYPE, "application/x-ndjson")
            .body(commit_payload(path, content, message))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MirrorError::Status {
                status: response.status(),
                url,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SpaceStore {
        let config = SpaceConfig {
            repo_id: "acme/shop".to_string(),
            branch: "main".to_string(),
            token: "hf_test".to_string(),
        };
        SpaceStore::new(&config, reqwest::Client::new())
    }

    #[test]
    fn test_urls() {
        assert_eq!(
            store().resolve_url("products.json"),
            "https://huggingface.co/spaces/acme/shop/resolve/main/products.json"
        );
        assert_eq!(
            store().commit_url(),
            "https://huggingface.co/api/spaces/acme/shop/commit/main"
        );
    }

    #[test]
    fn test_commit_payload_shape() {
        let payload = commit_payload("uploads/mug.png", b"png-bytes", "Upload mug.png");
        let mut lines = payload.lines();

        let header: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(header["key"], "header");
        assert_eq!(header["value"]["summary"], "Upload mug.png");

        let file: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(file["key"], "file");
        assert_eq!(file["value"]["path"], "uploads/mug.png");
        assert_eq!(file["value"]["encoding"], "base64");
        let decoded = BASE64
            .decode(file["value"]["content"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, b"png-bytes");

        assert!(lines.next().is_none());
    }
}
