// yt-dlp metadata provider - runs the `yt-dlp` binary in simulate mode
//
// One invocation per URL with `--dump-single-json`. Playlist URLs (`list=`)
// come back as a single object whose `entries` hold the per-item info dicts.

use async_trait::async_trait;
use std::process::Command as StdCommand;

use crate::curator::config::CuratorConfig;
use crate::curator::errors::ProviderError;
use crate::curator::models::{AuthMode, RawMetadata};
use crate::curator::traits::MetadataProvider;
use crate::curator::utils::run_output_with_timeout;

/// Environment override for the yt-dlp executable
pub const YTDLP_ENV: &str = "CURATOR_YTDLP";

/// Provider backed by the yt-dlp executable
#[derive(Debug, Clone)]
pub struct YtDlpProvider {
    ytdlp_path: String,
    timeout_seconds: u32,
    proxy: Option<String>,
}

impl YtDlpProvider {
    pub fn new(config: &CuratorConfig) -> Self {
        Self {
            ytdlp_path: Self::find_ytdlp(),
            timeout_seconds: config.timeout_seconds,
            proxy: config.proxy.clone(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.ytdlp_path = program.into();
        self
    }

    /// Find yt-dlp binary
    fn find_ytdlp() -> String {
        if let Ok(custom) = std::env::var(YTDLP_ENV) {
            if !custom.trim().is_empty() {
                return custom;
            }
        }

        let common_paths = [
            "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
            "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
            "/usr/bin/yt-dlp",          // System installation
        ];

        for path in common_paths {
            if std::path::Path::new(path).exists() {
                return path.to_string();
            }
        }

        if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
            if output.status.success() {
                if let Ok(path) = String::from_utf8(output.stdout) {
                    let trimmed = path.trim();
                    if !trimmed.is_empty() {
                        return trimmed.to_string();
                    }
                }
            }
        }

        "yt-dlp".to_string()
    }

    fn is_playlist(url: &str) -> bool {
        url.contains("list=")
    }

    /// Build command arguments
    pub fn build_args(&self, url: &str, auth: &AuthMode) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.timeout_seconds.to_string(),
            "--retries".to_string(),
            "2".to_string(),
        ];

        args.push(if Self::is_playlist(url) {
            "--yes-playlist".to_string()
        } else {
            "--no-playlist".to_string()
        });

        if let Some(path) = auth.cookie_file() {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args.push(url.to_string());
        args
    }

    /// Split `--dump-single-json` output into per-item records
    pub fn parse_output(url: &str, stdout: &[u8]) -> Result<Vec<RawMetadata>, ProviderError> {
        let json_str = String::from_utf8_lossy(stdout);
        let json: serde_json::Value = serde_json::from_str(json_str.trim())
            .map_err(|e| ProviderError::InvalidOutput(format!("Invalid JSON: {}", e)))?;

        let serde_json::Value::Object(top) = json else {
            return Err(ProviderError::InvalidOutput(
                "yt-dlp output is not a JSON object".to_string(),
            ));
        };

        if !Self::is_playlist(url) {
            return Ok(vec![top]);
        }

        let entries = top
            .get("entries")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                ProviderError::InvalidOutput("No entries array in playlist JSON".to_string())
            })?;

        // Unavailable playlist items come back as null
        Ok(entries
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect())
    }
}

#[async_trait]
impl MetadataProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch(
        &self,
        url: &str,
        auth: &AuthMode,
    ) -> Result<Vec<RawMetadata>, ProviderError> {
        let args = self.build_args(url, auth);
        tracing::debug!("[YtDlp] Running: {} {}", self.ytdlp_path, args.join(" "));

        // Playlists run one extraction per item; give them room
        let budget = if Self::is_playlist(url) {
            self.timeout_seconds as u64 * 10
        } else {
            self.timeout_seconds as u64 * 2
        };

        let output = run_output_with_timeout(&self.ytdlp_path, args, budget).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!("[YtDlp] {} failed: {}", url, stderr.trim());
            return Err(ProviderError::from(stderr.trim().to_string()));
        }

        Self::parse_output(url, &output.stdout)
    }
}
