// Common data models for the catalog

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Raw metadata record as returned by a provider (one yt-dlp info dict)
pub type RawMetadata = serde_json::Map<String, serde_json::Value>;

/// One catalog record, keyed by the provider-assigned id
///
/// Optional fields persist as `null`, which keeps collection files readable by
/// earlier versions of the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub release_year: Option<i64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub artists: Option<Vec<String>>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channel_url: Option<String>,
    #[serde(default, deserialize_with = "seconds_or_null")]
    pub duration: Option<u64>,
    #[serde(default)]
    pub duration_string: Option<String>,
}

impl Entry {
    /// Bare entry with only the key set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            album: None,
            release_year: None,
            thumbnail: None,
            url: None,
            tags: None,
            artists: None,
            channel: None,
            channel_id: None,
            channel_url: None,
            duration: None,
            duration_string: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

// yt-dlp reports whole seconds for most sites but floats for some
fn seconds_or_null<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(seconds_from_json))
}

/// Whole seconds from a JSON number, truncating fractional values
pub(crate) fn seconds_from_json(value: &serde_json::Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|s| *s >= 0.0).map(|s| s as u64))
}

/// How the provider is allowed to talk to the source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Anonymous access, safe to parallelize
    #[default]
    Open,
    /// Cookie-bound session backed by a Netscape cookie jar
    Authenticated(PathBuf),
}

impl AuthMode {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn cookie_file(&self) -> Option<&PathBuf> {
        match self {
            Self::Open => None,
            Self::Authenticated(path) => Some(path),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Authenticated(_) => write!(f, "authenticated"),
        }
    }
}

/// What happened to one input URL during a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlOutcome {
    /// Provider returned this many usable entries
    Fetched { count: usize },
    /// URL was requeued
    Failed { reason: String },
}

/// Result of one fetch batch
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Every projected entry, in merge order
    pub entries: Vec<Entry>,
    /// URLs to requeue, verbatim as they were submitted
    pub failed: Vec<String>,
    /// Per-URL outcome, one per input URL
    pub outcomes: Vec<(String, UrlOutcome)>,
}

impl FetchReport {
    pub fn fetched_urls(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|(url, outcome)| match outcome {
            UrlOutcome::Fetched { .. } => Some(url.as_str()),
            UrlOutcome::Failed { .. } => None,
        })
    }

    pub fn succeeded(&self) -> usize {
        self.fetched_urls().count()
    }

    pub(crate) fn record_success(&mut self, url: String, entries: Vec<Entry>) {
        self.outcomes.push((url, UrlOutcome::Fetched { count: entries.len() }));
        self.entries.extend(entries);
    }

    pub(crate) fn record_failure(&mut self, url: String, reason: impl Into<String>) {
        self.failed.push(url.clone());
        self.outcomes.push((url, UrlOutcome::Failed { reason: reason.into() }));
    }
}
