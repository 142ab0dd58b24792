// Raw provider metadata -> Entry projection
//
// yt-dlp info dicts name the same fact differently depending on the
// extractor (music tracks carry `track`/`artists`, plain videos `title`/
// `creators`). Each target field reads its primary key and falls back to a
// secondary one when the primary is absent or null.

use serde_json::Value;

use super::models::{seconds_from_json, Entry, RawMetadata};

const WWW_PREFIX: &str = "https://www.youtube.com/";
const MUSIC_PREFIX: &str = "https://music.youtube.com/";
const MUSIC_HOST: &str = "music.youtube.com";

/// Target fields an `Entry` is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Title,
    Album,
    ReleaseYear,
    Thumbnail,
    Url,
    Tags,
    Artists,
    Channel,
    ChannelId,
    ChannelUrl,
    Duration,
    DurationString,
}

/// (target, primary key, fallback key)
pub const FIELD_MAP: &[(Field, &str, Option<&str>)] = &[
    (Field::Id, "id", None),
    (Field::Title, "track", Some("title")),
    (Field::Album, "album", None),
    (Field::ReleaseYear, "release_year", None),
    (Field::Thumbnail, "thumbnail", None),
    (Field::Url, "original_url", Some("webpage_url")),
    (Field::Tags, "tags", None),
    (Field::Artists, "artists", Some("creators")),
    (Field::Channel, "channel", Some("uploader")),
    (Field::ChannelId, "channel_id", Some("uploader_id")),
    (Field::ChannelUrl, "channel_url", Some("uploader_url")),
    (Field::Duration, "duration", None),
    (Field::DurationString, "duration_string", None),
];

fn lookup<'a>(raw: &'a RawMetadata, primary: &str, fallback: Option<&str>) -> Option<&'a Value> {
    raw.get(primary)
        .filter(|v| !v.is_null())
        .or_else(|| fallback.and_then(|key| raw.get(key)).filter(|v| !v.is_null()))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_text_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(as_text).collect())
}

/// Project one raw record. Returns `None` when the record has no usable id.
pub fn project(raw: &RawMetadata) -> Option<Entry> {
    let id = lookup(raw, "id", None).and_then(as_text)?;
    if id.is_empty() {
        return None;
    }
    let mut entry = Entry::new(id);

    for (field, primary, fallback) in FIELD_MAP {
        let Some(value) = lookup(raw, primary, *fallback) else {
            continue;
        };
        match field {
            Field::Id => {}
            Field::Title => entry.title = as_text(value),
            Field::Album => entry.album = as_text(value),
            Field::ReleaseYear => entry.release_year = value.as_i64(),
            Field::Thumbnail => entry.thumbnail = as_text(value),
            Field::Url => entry.url = as_text(value),
            Field::Tags => entry.tags = as_text_list(value),
            Field::Artists => entry.artists = as_text_list(value),
            Field::Channel => entry.channel = as_text(value),
            Field::ChannelId => entry.channel_id = as_text(value),
            Field::ChannelUrl => entry.channel_url = as_text(value),
            Field::Duration => entry.duration = seconds_from_json(value),
            Field::DurationString => entry.duration_string = as_text(value),
        }
    }

    Some(entry)
}

/// Project every record fetched for `source_url`, applying source-specific fixups
pub fn project_all(source_url: &str, records: &[RawMetadata]) -> Vec<Entry> {
    let music = source_url.contains(MUSIC_HOST);
    records
        .iter()
        .filter_map(|raw| {
            let entry = project(raw);
            if entry.is_none() {
                tracing::warn!("[Projection] Dropping record without id from {}", source_url);
            }
            entry
        })
        .map(|entry| if music { to_music_links(entry) } else { entry })
        .collect()
}

// Music links resolve to www pages in the info dict; keep them on the music host
fn to_music_links(mut entry: Entry) -> Entry {
    entry.url = entry.url.map(|u| u.replace(WWW_PREFIX, MUSIC_PREFIX));
    entry.channel_url = entry.channel_url.map(|u| u.replace(WWW_PREFIX, MUSIC_PREFIX));
    entry
}
