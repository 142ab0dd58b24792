// Metadata provider trait definition

use async_trait::async_trait;

use super::errors::ProviderError;
use super::models::{AuthMode, RawMetadata};

/// Turns a source URL into zero or more raw metadata records
///
/// Implementations own their network details, including timeouts. A URL that
/// stands for a collection (a playlist) yields one record per item.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Name of the provider (for logging)
    fn name(&self) -> &'static str;

    async fn fetch(&self, url: &str, auth: &AuthMode)
        -> Result<Vec<RawMetadata>, ProviderError>;
}
