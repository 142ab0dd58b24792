// Curator module - catalog core behind the synchronous session API

pub mod collection;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod pool;
pub mod projection;
pub mod providers;
pub mod queue;
pub mod session;
pub mod traits;
pub mod utils;

pub use collection::CollectionStore;
pub use config::CuratorConfig;
pub use cookies::{CookieConverter, ConvertOutcome};
pub use errors::{CuratorError, ProviderError, Result};
pub use models::{AuthMode, Entry, FetchReport, RawMetadata, UrlOutcome};
pub use orchestrator::FetchOrchestrator;
pub use pool::TaskPool;
pub use providers::YtDlpProvider;
pub use queue::UrlQueue;
pub use session::Curator;
pub use traits::MetadataProvider;
