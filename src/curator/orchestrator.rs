// Fetch orchestrator - fans lookups out over the provider
//
// Strategy:
// 1. URLs outside the configured source hosts are failed without a lookup
// 2. Open mode: one task per URL on a bounded pool, completion order
// 3. Authenticated mode: strictly serial in input order, since a shared
//    cookie session is not assumed safe for concurrent use
//
// Nothing here touches the collection. The caller merges `FetchReport`
// entries once the whole batch is done.

use std::sync::Arc;

use super::errors::{CuratorError, ProviderError};
use super::models::{AuthMode, Entry, FetchReport};
use super::pool::TaskPool;
use super::projection::project_all;
use super::traits::MetadataProvider;
use super::utils::{matches_source_host, strip_share_param};

pub struct FetchOrchestrator {
    provider: Arc<dyn MetadataProvider>,
    source_hosts: Vec<String>,
    max_concurrent: usize,
}

impl FetchOrchestrator {
    pub fn new(provider: Arc<dyn MetadataProvider>, source_hosts: Vec<String>) -> Self {
        Self {
            provider,
            source_hosts,
            max_concurrent: 8,
        }
    }

    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.max_concurrent = limit.max(1);
        self
    }

    /// Whether the provider is asked about this URL at all
    pub fn is_recognized(&self, url: &str) -> bool {
        matches_source_host(url, &self.source_hosts)
    }

    /// Pool for the given auth mode; authenticated sessions get a pool of one
    pub fn pool_for(&self, auth: &AuthMode) -> TaskPool {
        if auth.is_authenticated() {
            TaskPool::serial()
        } else {
            TaskPool::new(self.max_concurrent)
        }
    }

    /// Look up every URL. Each input URL ends up either contributing entries
    /// or listed in `failed`, verbatim.
    pub async fn fetch_urls(&self, urls: &[String], auth: &AuthMode) -> FetchReport {
        let mut report = FetchReport::default();
        let mut recognized = Vec::new();

        for url in urls {
            if self.is_recognized(url) {
                recognized.push(url.clone());
            } else {
                tracing::info!("[Orchestrator] Not a supported source, requeueing: {}", url);
                report.record_failure(url.clone(), "unsupported source");
            }
        }

        if recognized.is_empty() {
            return report;
        }

        let pool = self.pool_for(auth);
        tracing::info!(
            "[Orchestrator] Fetching {} URL(s) via {} ({} mode, pool of {})",
            recognized.len(),
            self.provider.name(),
            auth,
            pool.limit()
        );

        let provider = Arc::clone(&self.provider);
        let task_auth = auth.clone();
        let results = pool
            .run(recognized, move |url: String| {
                let provider = Arc::clone(&provider);
                let auth = task_auth.clone();
                async move { lookup(provider.as_ref(), &url, &auth).await }
            })
            .await;

        for (url, outcome) in results {
            match outcome {
                Ok(Ok(entries)) => {
                    tracing::info!("[Orchestrator] ✓ {} ({} entries)", url, entries.len());
                    report.record_success(url, entries);
                }
                Ok(Err(e)) => {
                    tracing::warn!("[Orchestrator] ✗ {}: {}", url, e);
                    report.record_failure(url, e.to_string());
                }
                Err(reason) => {
                    let err = CuratorError::TaskFailed {
                        url: url.clone(),
                        reason,
                    };
                    tracing::warn!("[Orchestrator] ✗ {}", err);
                    report.record_failure(url, err.to_string());
                }
            }
        }

        tracing::info!(
            "[Orchestrator] Batch done: {} fetched, {} failed, {} entries",
            report.succeeded(),
            report.failed.len(),
            report.entries.len()
        );
        report
    }
}

// One provider call, projected; an empty result counts as a failure
async fn lookup(
    provider: &dyn MetadataProvider,
    url: &str,
    auth: &AuthMode,
) -> Result<Vec<Entry>, ProviderError> {
    let target = strip_share_param(url);
    let records = provider.fetch(target, auth).await?;
    let entries = project_all(target, &records);
    if entries.is_empty() {
        return Err(ProviderError::InvalidOutput(format!(
            "no usable records ({} returned)",
            records.len()
        )));
    }
    Ok(entries)
}
