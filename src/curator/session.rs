// Curator session - the synchronous surface used by front-ends
//
// Owns the collection and performs all file I/O. Every public operation
// reports success as a bool and logs the reason for a failure.

use std::fs;
use std::sync::Arc;

use super::collection::CollectionStore;
use super::config::CuratorConfig;
use super::cookies::CookieConverter;
use super::errors::{CuratorError, Result};
use super::models::FetchReport;
use super::orchestrator::FetchOrchestrator;
use super::providers::YtDlpProvider;
use super::queue::UrlQueue;
use super::traits::MetadataProvider;

pub struct Curator {
    config: CuratorConfig,
    collection: CollectionStore,
    queue: UrlQueue,
    cookies: CookieConverter,
    orchestrator: FetchOrchestrator,
}

impl Curator {
    /// Session backed by the yt-dlp provider
    pub fn new(config: CuratorConfig) -> Self {
        let provider = Arc::new(YtDlpProvider::new(&config));
        Self::with_provider(config, provider)
    }

    pub fn with_provider(config: CuratorConfig, provider: Arc<dyn MetadataProvider>) -> Self {
        let orchestrator = FetchOrchestrator::new(provider, config.source_hosts.clone())
            .with_max_concurrent(config.max_concurrent);
        Self {
            queue: UrlQueue::new(config.urls_path()),
            collection: CollectionStore::new(),
            cookies: CookieConverter::new(),
            orchestrator,
            config,
        }
    }

    pub fn config(&self) -> &CuratorConfig {
        &self.config
    }

    pub fn collection(&self) -> &CollectionStore {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut CollectionStore {
        &mut self.collection
    }

    pub fn queue(&self) -> &UrlQueue {
        &self.queue
    }

    /// Toggle authenticated (cookie-bound, serial) fetching
    pub fn set_use_cookie(&mut self, enabled: bool) {
        self.config.use_cookie = enabled;
    }

    pub fn convert_cookie(&self) -> bool {
        self.cookies.convert(&self.config.cookie_path())
    }

    pub fn save(&self) -> bool {
        report("save", self.try_save())
    }

    pub fn load(&mut self) -> bool {
        report("load", self.try_load())
    }

    pub fn fetch_urls(&mut self) -> bool {
        report("fetch", self.try_fetch_urls().map(|_| ()))
    }

    /// Write every collection URL to the pending file, replacing its contents.
    /// Returns the number of URLs written.
    pub fn extract_urls(&self) -> Option<usize> {
        match self.try_extract_urls() {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!("[Curator] extract failed: {}", e);
                None
            }
        }
    }

    pub fn try_save(&self) -> Result<()> {
        let path = self.config.collection_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.collection.serialize()?)?;
        tracing::info!(
            "[Curator] Saved {} entries to {}",
            self.collection.len(),
            path.display()
        );
        Ok(())
    }

    /// Replace the in-memory collection with the file contents.
    ///
    /// A missing file is an error; a malformed one leaves the collection as it was.
    pub fn try_load(&mut self) -> Result<()> {
        let path = self.config.collection_path();
        if !path.exists() {
            return Err(CuratorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no collection at {}", path.display()),
            )));
        }
        let text = fs::read_to_string(&path)?;
        self.collection.deserialize(&text)?;
        tracing::info!(
            "[Curator] Loaded {} entries from {}",
            self.collection.len(),
            path.display()
        );
        Ok(())
    }

    /// Blocking wrapper around `fetch_pending` on a private runtime.
    ///
    /// Inside an async context the batch runs on a dedicated thread, as
    /// `block_on` cannot nest in a runtime.
    pub fn try_fetch_urls(&mut self) -> Result<FetchReport> {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.fetch_blocking();
        }

        tracing::debug!("[Curator] Called from a runtime, fetching on a separate thread");
        std::thread::scope(|scope| {
            scope
                .spawn(move || self.fetch_blocking())
                .join()
                .unwrap_or_else(|_| Err(CuratorError::Runtime("fetch thread panicked".to_string())))
        })
    }

    fn fetch_blocking(&mut self) -> Result<FetchReport> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CuratorError::Runtime(e.to_string()))?;
        runtime.block_on(self.fetch_pending())
    }

    /// One processing pass over the pending file.
    ///
    /// Entries are merged last-fetched-wins; the pending file is replaced by
    /// the URLs that failed. A missing pending file is created empty and
    /// reported as an error so the user knows where to put URLs.
    pub async fn fetch_pending(&mut self) -> Result<FetchReport> {
        if !self.queue.exists() {
            self.queue.ensure_exists()?;
            return Err(CuratorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("created empty {}", self.queue.path().display()),
            )));
        }

        let urls = self.queue.load_pending()?;
        let auth = self.config.auth_mode();
        let report = self.orchestrator.fetch_urls(&urls, &auth).await;

        let mut replaced = 0usize;
        for entry in &report.entries {
            if self.collection.get(&entry.id).is_some() {
                replaced += 1;
            }
            self.collection.add(entry.id.clone(), entry.clone(), true);
        }
        self.queue.persist_failed(&report.failed)?;

        tracing::info!(
            "[Curator] Merged {} entries ({} replaced), {} URL(s) left pending",
            report.entries.len(),
            replaced,
            report.failed.len()
        );
        Ok(report)
    }

    pub fn try_extract_urls(&self) -> Result<usize> {
        let urls = UrlQueue::rebuild_from_collection(&self.collection);
        self.queue.replace_with(&urls)?;
        tracing::info!(
            "[Curator] Extracted {} URL(s) to {}",
            urls.len(),
            self.queue.path().display()
        );
        Ok(urls.len())
    }
}

fn report(operation: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("[Curator] {} failed: {}", operation, e);
            false
        }
    }
}
