//! Lorebook (world info) listing and lookup.
//!
//! Lorebooks live either directly as `worlds/<name>.json` or as
//! `worlds/<name>/lorebook.json`. Both forms are listed, even when they
//! share a name.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::assets::{confine, contain};
use crate::cards::fields::{lookup_str, NAME_PATHS};
use crate::error::{LibraryError, Result};
use crate::lorebook::{digest, entries_of, normalize_entries};

use super::{compare_names, has_json_extension, read_dir_sorted, read_json, Library};

/// File name of a lorebook stored in its own directory.
pub const NESTED_LOREBOOK_FILE: &str = "lorebook.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LorebookSummary {
    pub id: String,
    pub name: String,
    pub entry_count: usize,
    pub sample_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LorebookDetail {
    pub id: String,
    pub name: String,
    pub entries: Vec<Value>,
}

/// Id (path relative to `worlds/`) and fallback name of a lorebook file.
fn identity(worlds: &Path, path: &Path) -> (String, String) {
    let relative = path.strip_prefix(worlds).unwrap_or(path);
    let id = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");

    let nested = relative.components().count() > 1;
    let fallback = if nested {
        path.parent().and_then(|p| p.file_name())
    } else {
        path.file_stem()
    };
    let fallback = fallback
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| id.clone());
    (id, fallback)
}

fn lorebook_name(world: &Value, fallback: String) -> String {
    lookup_str(world, NAME_PATHS)
        .map(str::to_string)
        .unwrap_or(fallback)
}

impl Library {
    /// Both discovery forms, in directory order.
    fn lorebook_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for path in read_dir_sorted(&self.worlds_dir())? {
            if path.is_file() && has_json_extension(&path) {
                files.push(path);
            } else if path.is_dir() {
                let nested = path.join(NESTED_LOREBOOK_FILE);
                if !nested.is_file() {
                    continue;
                }
                match confine(&path, nested) {
                    Ok(nested) => files.push(nested),
                    Err(e) => log::warn!("Skipping lorebook {}", e),
                }
            }
        }
        Ok(files)
    }

    /// Summaries of every readable lorebook, sorted by name then id.
    pub fn list_lorebooks(&self) -> Result<Vec<LorebookSummary>> {
        let worlds = self.worlds_dir();
        let mut summaries = Vec::new();
        for path in self.lorebook_files()? {
            let world = match read_json(&path) {
                Ok(world) => world,
                Err(e) => {
                    log::warn!("Skipping lorebook {:?}: {}", path, e);
                    continue;
                }
            };
            let (id, fallback) = identity(&worlds, &path);
            let d = digest(&entries_of(&world));
            summaries.push(LorebookSummary {
                id,
                name: lorebook_name(&world, fallback),
                entry_count: d.entry_count,
                sample_keys: d.sample_keys,
            });
        }
        summaries.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    /// One lorebook with normalized entries.
    ///
    /// `id` may be a listed id (`Foo.json`, `Foo/lorebook.json`) or a bare
    /// name, tried as `Foo.json` and then `Foo/lorebook.json`.
    pub fn get_lorebook(&self, id: &str) -> Result<LorebookDetail> {
        let worlds = self.worlds_dir();
        let base = contain(&worlds, id)?;

        let mut with_extension = OsString::from(base.as_os_str());
        with_extension.push(".json");
        let candidates = [
            base.clone(),
            PathBuf::from(with_extension),
            base.join(NESTED_LOREBOOK_FILE),
        ];
        let path = candidates
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        let path = confine(&worlds, path)?;

        let world = read_json(&path)?;
        let (id, fallback) = identity(&worlds, &path);
        Ok(LorebookDetail {
            id,
            name: lorebook_name(&world, fallback),
            entries: normalize_entries(&world),
        })
    }
}
