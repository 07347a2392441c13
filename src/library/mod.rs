//! Listing and lookup over a chat application's user data directory.
//!
//! Every call re-reads the files it needs; nothing is cached. Listings skip
//! (and log) items that fail to load, while single-item lookups return the
//! most specific [`LibraryError`](crate::error::LibraryError).
//!
//! Expected layout under the data root:
//!
//! ```text
//! characters/   *.json and *.png cards
//! worlds/       *.json lorebooks, or <name>/lorebook.json
//! groups/       *.json group definitions
//! settings.json
//! ```

pub mod characters;
pub mod groups;
pub mod lorebooks;
pub mod personas;

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::assets::{confine, AssetResolver};
use crate::cards::CardResolver;
use crate::error::{read_error, LibraryError, Result};

pub use groups::{GroupDetail, GroupMember, GroupSummary};
pub use lorebooks::{LorebookDetail, LorebookSummary};

const CHARACTERS_DIR: &str = "characters";
const WORLDS_DIR: &str = "worlds";
const GROUPS_DIR: &str = "groups";
const SETTINGS_FILE: &str = "settings.json";

/// Entry point for all data lookups.
#[derive(Debug, Clone)]
pub struct Library {
    assets: AssetResolver,
    cards: CardResolver,
}

impl Library {
    pub fn new(assets: AssetResolver) -> Self {
        Self {
            cards: CardResolver::new(assets.clone()),
            assets,
        }
    }

    pub fn data_root(&self) -> &Path {
        self.assets.data_root()
    }

    pub fn assets(&self) -> &AssetResolver {
        &self.assets
    }

    pub fn characters_dir(&self) -> PathBuf {
        self.data_root().join(CHARACTERS_DIR)
    }

    pub fn worlds_dir(&self) -> PathBuf {
        self.data_root().join(WORLDS_DIR)
    }

    pub fn groups_dir(&self) -> PathBuf {
        self.data_root().join(GROUPS_DIR)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_root().join(SETTINGS_FILE)
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Read and parse a JSON file.
pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| read_error(path, e))?;
    serde_json::from_str(&content).map_err(|e| LibraryError::bad_json(path, &e))
}

/// Entries of `dir` sorted by file name. A missing directory is empty.
///
/// Entries that resolve outside `dir` through a symlink are skipped.
pub(crate) fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        match confine(dir, path) {
            Ok(path) => paths.push(path),
            Err(e) => log::warn!("Skipping {}", e),
        }
    }
    paths.sort();
    Ok(paths)
}

pub(crate) fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
}

/// Primary collation key: decomposed, accents stripped, case-folded.
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Accent- and case-insensitive name ordering.
///
/// `ávila` sorts with `a`, `Émile` with `e`. Names equal under that key
/// fall back to the accent-aware lowercase form, then the raw string.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// A string, or a number rendered as one.
pub(crate) fn string_like(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
