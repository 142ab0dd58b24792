// Error types for the catalog core

use thiserror::Error;

/// Failure of a single metadata lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Network timeout, or the tool did not finish in time
    #[error("network timeout: {0}")]
    Timeout(String),

    /// The source throttled or blocked the request (429, bot detection, etc.)
    #[error("request blocked by the source: {0}")]
    Blocked(String),

    /// yt-dlp not found in system
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// The provider does not handle this URL
    #[error("unsupported URL: {0}")]
    UnsupportedUrl(String),

    /// The provider answered but its output could not be read
    #[error("unreadable provider output: {0}")]
    InvalidOutput(String),

    /// Command execution failed
    #[error("execution error: {0}")]
    Execution(String),

    /// Unknown error with details
    #[error("unknown error: {0}")]
    Unknown(String),
}

// Classify raw tool stderr into a provider error
impl From<String> for ProviderError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::Timeout(s);
        }

        if lower.contains("429") || lower.contains("bot") || lower.contains("blocked") {
            return Self::Blocked(s);
        }

        if lower.contains("command not found")
            || lower.contains("no such file")
            || lower.contains("yt-dlp not found")
        {
            return Self::ToolNotFound(s);
        }

        if lower.contains("invalid url") || lower.contains("unsupported url") {
            return Self::UnsupportedUrl(s);
        }

        if lower.contains("json") || lower.contains("parse") {
            return Self::InvalidOutput(s);
        }

        Self::Unknown(s)
    }
}

impl From<&str> for ProviderError {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CuratorError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("fetch task for {url} failed: {reason}")]
    TaskFailed { url: String, reason: String },

    #[error("async runtime unavailable: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, CuratorError>;
