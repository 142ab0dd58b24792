// Id-keyed, deduplicating store of catalog entries
//
// The store never touches the filesystem. Callers read and write the text
// produced by `serialize` / consumed by `deserialize`.

use std::collections::BTreeMap;

use serde_json::Value;

use super::errors::{CuratorError, Result};
use super::models::Entry;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionStore {
    entries: BTreeMap<String, Entry>,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry` under `id`.
    ///
    /// Returns `false` without touching the store when `id` is already present
    /// and `overwrite` is off. With `overwrite` the previous entry is replaced
    /// wholesale.
    pub fn add(&mut self, id: impl Into<String>, entry: Entry, overwrite: bool) -> bool {
        let id = id.into();
        if !overwrite && self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, entry);
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in id order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    /// Source URL of every entry that has one, in id order
    pub fn urls(&self) -> Vec<String> {
        self.entries
            .values()
            .filter_map(|entry| entry.url.clone())
            .collect()
    }

    /// Pretty-printed JSON object of id -> entry
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Replace the whole store with the contents of `text`.
    ///
    /// Accepts the current object form and the legacy list form (an array of
    /// entry objects). On failure the store is left as it was.
    pub fn deserialize(&mut self, text: &str) -> Result<()> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| CuratorError::Parse(format!("collection is not valid JSON: {e}")))?;

        let entries = match value {
            Value::Object(_) => Self::check_keys(
                serde_json::from_value::<BTreeMap<String, Entry>>(value)
                    .map_err(|e| CuratorError::Parse(format!("malformed collection entry: {e}")))?,
            )?,
            Value::Array(items) => Self::migrate_list(items)?,
            other => {
                return Err(CuratorError::Parse(format!(
                    "collection must be a JSON object, found {}",
                    json_kind(&other)
                )))
            }
        };

        self.entries = entries;
        Ok(())
    }

    // Every key must be the id of the entry stored under it
    fn check_keys(entries: BTreeMap<String, Entry>) -> Result<BTreeMap<String, Entry>> {
        if let Some((key, entry)) = entries.iter().find(|(key, entry)| **key != entry.id) {
            return Err(CuratorError::Parse(format!(
                "collection key {key:?} holds entry with id {:?}",
                entry.id
            )));
        }
        Ok(entries)
    }

    // Legacy list files were deduplicated with first-wins semantics on add
    fn migrate_list(items: Vec<Value>) -> Result<BTreeMap<String, Entry>> {
        let mut entries = BTreeMap::new();
        let mut duplicates = 0usize;
        for item in items {
            let entry: Entry = serde_json::from_value(item)
                .map_err(|e| CuratorError::Parse(format!("malformed collection entry: {e}")))?;
            if entries.contains_key(&entry.id) {
                duplicates += 1;
                continue;
            }
            entries.insert(entry.id.clone(), entry);
        }
        tracing::info!(
            "[Collection] Migrated legacy list collection ({} entries, {} duplicates dropped)",
            entries.len(),
            duplicates
        );
        Ok(entries)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
