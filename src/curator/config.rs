// Runtime configuration for a curator session

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::{CuratorError, Result};
use super::models::AuthMode;

/// Name of the optional settings file inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Configuration passed into the curator at call time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    /// Directory holding the collection, pending URLs and cookie jar
    pub data_dir: PathBuf,
    /// Collection file name (relative to `data_dir`)
    pub collection_file: String,
    /// Pending URL list file name (relative to `data_dir`)
    pub urls_file: String,
    /// Cookie jar file name (relative to `data_dir`)
    pub cookie_file: String,
    /// Fetch with the cookie jar (serial, authenticated)
    pub use_cookie: bool,
    /// Upper bound on concurrent lookups in open mode
    pub max_concurrent: usize,
    /// Per-lookup timeout in seconds, enforced by the provider
    pub timeout_seconds: u32,
    /// SOCKS5/HTTP proxy URL handed to the provider
    pub proxy: Option<String>,
    /// Hosts (or host suffixes) the provider is asked about
    pub source_hosts: Vec<String>,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            collection_file: "collection.json".to_string(),
            urls_file: "urls.txt".to_string(),
            cookie_file: "youtube_cookie.txt".to_string(),
            use_cookie: false,
            max_concurrent: 8,
            timeout_seconds: 60,
            proxy: None,
            source_hosts: vec!["youtube.com".to_string(), "youtu.be".to_string()],
        }
    }
}

impl CuratorConfig {
    /// Defaults rooted in the per-user data directory
    pub fn user_default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join("curator"))
            .unwrap_or_else(|| PathBuf::from("data"));
        Self::default().with_data_dir(data_dir)
    }

    /// Read `config.json` from `data_dir`, falling back to defaults rooted there
    pub fn load_or_default(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default().with_data_dir(data_dir));
        }
        let bytes = std::fs::read(&path)?;
        let parsed: CuratorConfig = serde_json::from_slice(&bytes).map_err(|e| {
            CuratorError::Parse(format!(
                "failed to parse config at {}: {e}",
                path.to_string_lossy()
            ))
        })?;
        Ok(parsed.with_data_dir(data_dir))
    }

    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(self.data_dir.join(CONFIG_FILE_NAME), format!("{json}\n"))?;
        Ok(())
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_use_cookie(mut self, enabled: bool) -> Self {
        self.use_cookie = enabled;
        self
    }

    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.max_concurrent = limit.max(1);
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_source_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn collection_path(&self) -> PathBuf {
        self.data_dir.join(&self.collection_file)
    }

    pub fn urls_path(&self) -> PathBuf {
        self.data_dir.join(&self.urls_file)
    }

    pub fn cookie_path(&self) -> PathBuf {
        self.data_dir.join(&self.cookie_file)
    }

    /// Auth mode implied by the cookie toggle
    pub fn auth_mode(&self) -> AuthMode {
        if self.use_cookie {
            AuthMode::Authenticated(self.cookie_path())
        } else {
            AuthMode::Open
        }
    }
}
