//! Application Configuration
//!
//! Configuration is read from `config.yaml` when present, with sensible
//! defaults otherwise, then overridden from the environment. Mirror
//! credentials only ever come from the environment in production; a mirror
//! whose token or repository identifier is absent is simply disabled, which
//! degrades the process to local-only persistence rather than failing.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

const CONFIG_PATH: &str = "config.yaml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Local catalog storage configuration
    pub catalog: CatalogConfig,
    /// Remote mirror configuration
    pub mirrors: MirrorsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
    /// Maximum request payload size in bytes
    pub max_payload_size: usize,
}

/// Local catalog storage configuration. Uploaded images always live in an
/// `uploads/` directory under `data_dir` so that stored `/uploads/...` image
/// paths stay valid across configuration changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding the catalog document and the upload directory
    pub data_dir: String,
    /// File name of the catalog document, also its path on the mirrors
    pub catalog_file: String,
}

/// Remote mirror configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorsConfig {
    /// Timeout for remote mirror calls, in seconds
    pub timeout_secs: u64,
    /// Source-control mirror; authoritative for reads when configured
    #[serde(default)]
    pub github: Option<GithubConfig>,
    /// Hosted-space mirror; write-only from this process
    #[serde(default)]
    pub space: Option<SpaceConfig>,
}

/// GitHub repository mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// "owner/name"
    pub repo: String,
    pub branch: String,
    pub token: String,
}

/// Hugging Face Space mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceConfig {
    /// "owner/space-name"
    pub repo_id: String,
    pub branch: String,
    pub token: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Path to the log4rs configuration file; env_logger is used when absent
    pub config_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 7860,
                workers: 4,
                max_payload_size: 16 * 1024 * 1024, // enough for product images
            },
            catalog: CatalogConfig {
                data_dir: "./data".to_string(),
                catalog_file: "products.json".to_string(),
            },
            mirrors: MirrorsConfig {
                timeout_secs: 15,
                github: None,
                space: None,
            },
            logging: LoggingConfig {
                config_file: "server_log.yaml".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from file, use defaults if not found, then apply
    /// environment overrides.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = if Path::new(CONFIG_PATH).exists() {
            let content = fs::read_to_string(CONFIG_PATH)?;
            let config: AppConfig = serde_yaml::from_str(&content)?;
            info!("Loaded configuration from {}", CONFIG_PATH);
            config
        } else {
            warn!("Config file not found, using defaults");
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Environment overrides: mirror credentials and the data directory.
    /// A mirror is enabled only when both its repository identifier and token
    /// are present.
    pub fn apply_env(&mut self) {
        if let Ok(data_dir) = env::var("DATA_DIR") {
            self.catalog.data_dir = data_dir;
        }

        match (env::var("GITHUB_TOKEN"), env::var("GITHUB_REPO")) {
            (Ok(token), Ok(repo)) if !token.is_empty() && !repo.is_empty() => {
                let branch = env::var("GITHUB_BRANCH").unwrap_or_else(|_| "main".to_string());
                info!("GitHub mirror enabled for {} ({})", repo, branch);
                self.mirrors.github = Some(GithubConfig { repo, branch, token });
            }
            _ => {
                if self.mirrors.github.is_none() {
                    info!("GitHub mirror not configured, running without it");
                }
            }
        }

        match (env::var("HF_TOKEN"), env::var("SPACE_REPO_ID")) {
            (Ok(token), Ok(repo_id)) if !token.is_empty() && !repo_id.is_empty() => {
                let branch = env::var("SPACE_BRANCH").unwrap_or_else(|_| "main".to_string());
                info!("Space mirror enabled for {} ({})", repo_id, branch);
                self.mirrors.space = Some(SpaceConfig {
                    repo_id,
                    branch,
                    token,
                });
            }
            _ => {
                if self.mirrors.space.is_none() {
                    info!("Space mirror not configured, running without it");
                }
            }
        }
    }
}
