pub mod curator;

pub use curator::{
    AuthMode, CollectionStore, ConvertOutcome, CookieConverter, Curator, CuratorConfig,
    CuratorError, Entry, FetchOrchestrator, FetchReport, MetadataProvider, ProviderError,
    RawMetadata, Result, TaskPool, UrlOutcome, UrlQueue, YtDlpProvider,
};
