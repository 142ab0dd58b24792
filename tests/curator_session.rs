use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use curator_lib::{
    AuthMode, Curator, CuratorConfig, Entry, MetadataProvider, ProviderError, RawMetadata,
};

/// Provider answering from a fixed table and recording what it was asked
#[derive(Default)]
struct TableProvider {
    table: HashMap<String, Vec<serde_json::Value>>,
    seen: Mutex<Vec<(String, bool)>>,
}

impl TableProvider {
    fn answer(mut self, url: &str, records: Vec<serde_json::Value>) -> Self {
        self.table.insert(url.to_string(), records);
        self
    }
}

#[async_trait]
impl MetadataProvider for TableProvider {
    fn name(&self) -> &'static str {
        "table"
    }

    async fn fetch(&self, url: &str, auth: &AuthMode) -> Result<Vec<RawMetadata>, ProviderError> {
        self.seen
            .lock()
            .unwrap()
            .push((url.to_string(), auth.is_authenticated()));
        self.table
            .get(url)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| r.as_object().cloned())
                    .collect()
            })
            .ok_or_else(|| ProviderError::from("ERROR: Video unavailable"))
    }
}

fn config(dir: &Path) -> CuratorConfig {
    CuratorConfig::default()
        .with_data_dir(dir)
        .with_source_hosts(["youtube.com", "example-video.test"])
}

fn write_pending(dir: &Path, lines: &[&str]) {
    fs::write(dir.join("urls.txt"), lines.join("\n")).unwrap();
}

fn read_pending(dir: &Path) -> String {
    fs::read_to_string(dir.join("urls.txt")).unwrap()
}

#[test]
fn fetched_url_is_merged_and_dequeued() {
    let dir = tempfile::tempdir().unwrap();
    write_pending(dir.path(), &["https://example-video.test/watch?id=abc"]);
    let provider = Arc::new(TableProvider::default().answer(
        "https://example-video.test/watch?id=abc",
        vec![json!({"id": "abc", "title": "Song"})],
    ));

    let mut curator = Curator::with_provider(config(dir.path()), provider);
    assert!(curator.fetch_urls());

    let entry = curator.collection().get("abc").unwrap();
    assert_eq!(entry.title.as_deref(), Some("Song"));
    assert_eq!(read_pending(dir.path()), "");
}

#[test]
fn unrecognized_url_is_requeued_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    write_pending(dir.path(), &["https://elsewhere.test/v/1?x=1&si=keep"]);
    let provider = Arc::new(TableProvider::default());

    let mut curator = Curator::with_provider(config(dir.path()), provider.clone());
    curator
        .collection_mut()
        .add("old", Entry::new("old").with_title("Old"), false);
    let before = curator.collection().clone();

    assert!(curator.fetch_urls());

    assert_eq!(read_pending(dir.path()), "https://elsewhere.test/v/1?x=1&si=keep");
    assert_eq!(curator.collection(), &before);
    assert!(provider.seen.lock().unwrap().is_empty());
}

#[test]
fn missing_pending_file_is_created_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut curator =
        Curator::with_provider(config(dir.path()), Arc::new(TableProvider::default()));

    assert!(!curator.fetch_urls());
    assert_eq!(read_pending(dir.path()), "");
}

#[test]
fn refetch_overwrites_existing_entry() {
    let dir = tempfile::tempdir().unwrap();
    write_pending(dir.path(), &["https://www.youtube.com/watch?v=abc&si=tracking"]);
    let provider = Arc::new(TableProvider::default().answer(
        "https://www.youtube.com/watch?v=abc",
        vec![json!({"id": "abc", "title": "New Title", "uploader": "Chan"})],
    ));

    let mut curator = Curator::with_provider(config(dir.path()), provider);
    let mut stale = Entry::new("abc").with_title("Old Title");
    stale.album = Some("Old Album".into());
    curator.collection_mut().add("abc", stale, false);

    assert!(curator.fetch_urls());

    let entry = curator.collection().get("abc").unwrap();
    assert_eq!(entry.title.as_deref(), Some("New Title"));
    assert_eq!(entry.channel.as_deref(), Some("Chan"));
    assert_eq!(entry.album, None);
}

#[test]
fn failures_replace_the_pending_file() {
    let dir = tempfile::tempdir().unwrap();
    write_pending(
        dir.path(),
        &[
            "https://www.youtube.com/watch?v=ok",
            "",
            "https://www.youtube.com/watch?v=gone",
            "https://vimeo.com/9",
        ],
    );
    let provider = Arc::new(TableProvider::default().answer(
        "https://www.youtube.com/watch?v=ok",
        vec![json!({"id": "ok"})],
    ));

    let mut curator = Curator::with_provider(config(dir.path()), provider);
    assert!(curator.fetch_urls());

    let mut left: Vec<_> = read_pending(dir.path())
        .lines()
        .map(str::to_string)
        .collect();
    left.sort();
    assert_eq!(
        left,
        vec!["https://vimeo.com/9", "https://www.youtube.com/watch?v=gone"]
    );
    assert!(curator.collection().get("ok").is_some());
}

#[tokio::test]
async fn cookie_mode_fetches_serially_with_authentication() {
    let dir = tempfile::tempdir().unwrap();
    let pending = [
        "https://www.youtube.com/watch?v=1",
        "https://www.youtube.com/watch?v=2",
        "https://www.youtube.com/watch?v=3",
    ];
    write_pending(dir.path(), &pending);
    let mut provider = TableProvider::default();
    for (i, url) in pending.iter().enumerate() {
        provider = provider.answer(url, vec![json!({"id": format!("v{i}")})]);
    }
    let provider = Arc::new(provider);

    let mut curator =
        Curator::with_provider(config(dir.path()).with_use_cookie(true), provider.clone());
    let report = curator.fetch_pending().await.unwrap();

    assert!(report.failed.is_empty());
    let seen = provider.seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        pending
            .iter()
            .map(|u| (u.to_string(), true))
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn blocking_fetch_works_inside_a_runtime() {
    let dir = tempfile::tempdir().unwrap();
    write_pending(
        dir.path(),
        &[
            "https://www.youtube.com/watch?v=abc",
            "https://www.youtube.com/watch?v=gone",
        ],
    );
    let provider = Arc::new(TableProvider::default().answer(
        "https://www.youtube.com/watch?v=abc",
        vec![json!({"id": "abc"})],
    ));

    let mut curator = Curator::with_provider(config(dir.path()), provider);
    assert!(curator.fetch_urls());

    assert!(curator.collection().get("abc").is_some());
    assert_eq!(read_pending(dir.path()), "https://www.youtube.com/watch?v=gone");
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let mut curator =
        Curator::with_provider(config(dir.path()), Arc::new(TableProvider::default()));
    let mut entry = Entry::new("abc").with_title("Song");
    entry.tags = Some(vec!["a".into()]);
    curator.collection_mut().add("abc", entry, false);
    assert!(curator.save());

    let mut reloaded =
        Curator::with_provider(config(dir.path()), Arc::new(TableProvider::default()));
    assert!(reloaded.load());
    assert_eq!(reloaded.collection(), curator.collection());
}

#[test]
fn malformed_collection_fails_load_and_keeps_state() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("collection.json"), "{ broken").unwrap();
    let mut curator =
        Curator::with_provider(config(dir.path()), Arc::new(TableProvider::default()));
    curator
        .collection_mut()
        .add("keep", Entry::new("keep"), false);

    assert!(!curator.load());
    assert!(curator.collection().get("keep").is_some());
    assert_eq!(
        fs::read_to_string(dir.path().join("collection.json")).unwrap(),
        "{ broken"
    );
}

#[test]
fn missing_collection_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut curator =
        Curator::with_provider(config(dir.path()), Arc::new(TableProvider::default()));
    assert!(!curator.load());
}

#[test]
fn extract_replaces_pending_with_collection_urls() {
    let dir = tempfile::tempdir().unwrap();
    write_pending(dir.path(), &["https://www.youtube.com/watch?v=stale"]);
    let mut curator =
        Curator::with_provider(config(dir.path()), Arc::new(TableProvider::default()));
    curator.collection_mut().add(
        "a",
        Entry::new("a").with_url("https://www.youtube.com/watch?v=a"),
        false,
    );
    curator.collection_mut().add(
        "b",
        Entry::new("b").with_url("https://music.youtube.com/watch?v=b"),
        false,
    );

    assert_eq!(curator.extract_urls(), Some(2));
    assert_eq!(
        read_pending(dir.path()),
        "https://www.youtube.com/watch?v=a\nhttps://music.youtube.com/watch?v=b"
    );

    // Extracting twice does not accumulate duplicates
    assert_eq!(curator.extract_urls(), Some(2));
    assert_eq!(read_pending(dir.path()).lines().count(), 2);
}

#[test]
fn convert_cookie_uses_configured_jar() {
    let dir = tempfile::tempdir().unwrap();
    let curator = Curator::with_provider(config(dir.path()), Arc::new(TableProvider::default()));

    assert!(!curator.convert_cookie());
    assert_eq!(fs::read_to_string(dir.path().join("youtube_cookie.txt")).unwrap(), "");

    fs::write(
        dir.path().join("youtube_cookie.txt"),
        "SID\tabc\tyoutube.com\t/\tSession\t35\t✓\n",
    )
    .unwrap();
    assert!(curator.convert_cookie());
    assert_eq!(
        fs::read_to_string(dir.path().join("youtube_cookie.txt")).unwrap(),
        "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tSID\tabc\n"
    );
}
