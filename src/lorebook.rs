//! Lorebook entry normalization.
//!
//! World files store `entries` either as a list or as an object keyed by
//! uid, and name their trigger keys inconsistently. Both shapes are folded
//! into one ordered list here, and every entry gets a `keys` field.

use serde::Serialize;
use serde_json::{Map, Value};

/// Field names that may hold an entry's trigger keys, in priority order.
pub const TRIGGER_KEY_FIELDS: [&str; 4] = ["keys", "key", "keywords", "triggers"];

/// At most this many leading entries contribute sample keys.
pub const SAMPLE_ENTRY_LIMIT: usize = 3;

/// Upper bound on `sample_keys`.
pub const SAMPLE_KEY_LIMIT: usize = 10;

/// The raw shape of an `entries` value.
#[derive(Debug, Clone, PartialEq)]
pub enum Entries {
    List(Vec<Value>),
    /// Keyed by uid. Enumeration order is whatever the map yields; with
    /// `preserve_order` that is file order, but callers must not rely on it.
    Map(Map<String, Value>),
    Absent,
}

impl Entries {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Array(items)) => Entries::List(items.clone()),
            Some(Value::Object(map)) => Entries::Map(map.clone()),
            _ => Entries::Absent,
        }
    }

    /// Flatten into one ordered list.
    pub fn into_list(self) -> Vec<Value> {
        match self {
            Entries::List(items) => items,
            Entries::Map(map) => map.into_iter().map(|(_, entry)| entry).collect(),
            Entries::Absent => Vec::new(),
        }
    }
}

/// Entries of a world file as an ordered list.
pub fn entries_of(world: &Value) -> Vec<Value> {
    Entries::from_value(world.get("entries")).into_list()
}

/// Trigger keys from the first non-empty alias field.
///
/// Arrays count when they have at least one element; a bare non-empty
/// string counts as a single key. Non-string scalars are stringified.
pub fn trigger_keys(entry: &Value) -> Vec<String> {
    for field in TRIGGER_KEY_FIELDS {
        match entry.get(field) {
            Some(Value::Array(items)) if !items.is_empty() => {
                return items.iter().filter_map(key_string).collect();
            }
            Some(Value::String(s)) if !s.is_empty() => return vec![s.clone()],
            _ => {}
        }
    }
    Vec::new()
}

fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Overlay the derived `keys` onto an entry, keeping every other field.
///
/// Entries that are not objects are returned unchanged.
pub fn with_keys(mut entry: Value) -> Value {
    let keys = trigger_keys(&entry);
    if let Value::Object(fields) = &mut entry {
        fields.insert(
            "keys".to_string(),
            Value::Array(keys.into_iter().map(Value::String).collect()),
        );
    }
    entry
}

/// Normalize every entry of a world file.
pub fn normalize_entries(world: &Value) -> Vec<Value> {
    entries_of(world).into_iter().map(with_keys).collect()
}

/// Entry count and a handful of sample trigger keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryDigest {
    pub entry_count: usize,
    pub sample_keys: Vec<String>,
}

/// Summarize a normalized entry list.
pub fn digest(entries: &[Value]) -> EntryDigest {
    let mut sample_keys = Vec::new();
    'entries: for entry in entries.iter().take(SAMPLE_ENTRY_LIMIT) {
        for key in trigger_keys(entry) {
            if sample_keys.len() >= SAMPLE_KEY_LIMIT {
                break 'entries;
            }
            sample_keys.push(key);
        }
    }
    EntryDigest {
        entry_count: entries.len(),
        sample_keys,
    }
}
