//! GitHub contents-API mirror backend
//!
//! Stores each tracked file as a regular file in a branch of a GitHub
//! repository via `GET`/`PUT /repos/{repo}/contents/{path}`. The blob sha
//! returned by `get` acts as the version token: `put` re-reads it immediately
//! before writing so an update-in-place does not clobber concurrent writers.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::config::GithubConfig;
use crate::mirror::{BlobStore, MirrorError, RemoteFile};

const API_ROOT: &str = "https://api.github.com";
const ACCEPT_JSON: &str = "application/vnd.github+json";

pub struct GithubStore {
    client: reqwest::Client,
    /// "owner/name"
    repo: String,
    branch: String,
    token: String,
}

/// Subset of the contents-API response we care about.
#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

impl GithubStore {
    pub fn new(config: &GithubConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            token: config.token.clone(),
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/repos/{}/contents/{}", API_ROOT, self.repo, path)
    }
}

/// The contents API returns base64 with embedded newlines; strip all
/// whitespace before decoding.
fn decode_content(raw: &str) -> Result<Vec<u8>, MirrorError> {
    let compact: String = raw.split_whitespace().collect();
    BASE64
        .decode(compact)
        .map_err(|e| MirrorError::Decode(format!("invalid base64 content: {}", e)))
}

#[async_trait]
impl BlobStore for GithubStore {
    fn label(&self) -> &str {
        "github"
    }

    async fn get(&self, path: &str) -> Result<Option<RemoteFile>, MirrorError> {
        let url = self.contents_url(path);
        debug!("GitHub GET {} (ref {})", url, self.branch);

        let response = self
            .client
            .get(&url)
            .query(&[("ref", self.branch.as_str())])
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT_JSON)
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

        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| MirrorError::Decode(e.to_string()))?;
        let content = decode_content(body.content.as_deref().unwrap_or_default())?;

        Ok(Some(RemoteFile {
            content,
            revision: Some(body.sha),
        }))
    }

    async fn put(&self, path: &str, content: &[u8], message: &str) -> Result<(), MirrorError> {
        // Current blob sha is required to update an existing file; a missing
        // file degrades to create semantics.
        let sha = self.get(path).await?.and_then(|file| file.revision);

        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": self.branch,
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }

        let url = self.contents_url(path);
        debug!("GitHub PUT {} ({} bytes)", url, content.len());

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT_JSON)
            .json(&body)
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
