//! Run configuration: transport policy and output format.
//!
//! Values come from an optional TOML file and are then overridden by CLI
//! flags. The file is looked up, in order, at the explicit `--config` path,
//! the `SPEEDJOB_CONFIG` environment variable, and `./speedjob.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const CONFIG_ENV: &str = "SPEEDJOB_CONFIG";
pub const LOCAL_CONFIG: &str = "speedjob.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Settings baked into the shared HTTP client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Proxy URL for all requests (`http://`, `https://` or `socks5://`).
    pub proxy: Option<String>,
    /// Skip TLS certificate verification.
    pub insecure: bool,
    /// Keep idle connections pooled between requests.
    pub keep_alive: bool,
    /// Negotiate gzip content encoding.
    pub compression: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            insecure: false,
            keep_alive: false,
            compression: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Emit one JSON object per line instead of text.
    pub json: bool,
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Resolve the configuration file. An explicit path must load; the
    /// environment and local fallbacks only warn on failure.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(env_path);
            match Self::load(&path) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "{} set but file could not be loaded, trying fallback",
                        CONFIG_ENV
                    );
                }
            }
        }

        let local = Path::new(LOCAL_CONFIG);
        if local.exists() {
            match Self::load(local) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(path = %local.display(), error = %e, "local config could not be loaded, using defaults");
                }
            }
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }
}

/// Build the one client every fetch in a run shares.
pub fn build_client(cfg: &TransportConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .gzip(cfg.compression)
        .danger_accept_invalid_certs(cfg.insecure);

    if !cfg.keep_alive {
        builder = builder.pool_max_idle_per_host(0);
    }

    if let Some(proxy) = &cfg.proxy {
        let proxy = reqwest::Proxy::all(proxy.as_str())
            .with_context(|| format!("invalid proxy URL: {}", proxy))?;
        builder = builder.proxy(proxy);
    }

    if cfg.insecure {
        warn!("TLS certificate verification disabled");
    }

    builder.build().context("failed to build HTTP client")
}
