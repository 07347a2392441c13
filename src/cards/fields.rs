//! Prioritized field lookup over loosely-typed card JSON.
//!
//! Cards put the same field at the top level or under `data` depending on
//! the tool that wrote them. Each field has an ordered list of accessor
//! paths; the first path holding a usable value wins.

use serde_json::Value;

/// An accessor path, e.g. `&["data", "name"]`.
pub type FieldPath = &'static [&'static str];

pub const NAME_PATHS: &[FieldPath] = &[&["name"], &["data", "name"]];
pub const TAGS_PATHS: &[FieldPath] = &[&["tags"], &["data", "tags"]];
pub const DESCRIPTION_PATHS: &[FieldPath] = &[&["description"], &["data", "description"]];
pub const AVATAR_PATHS: &[FieldPath] = &[&["avatar"], &["data", "avatar"], &["profile_picture"]];

/// Follow `path` from `root`.
pub fn get_path<'v>(root: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(root, |value, key| value.get(*key))
}

/// First value along `paths` that `accept` turns into `Some`.
pub fn lookup<'v, T>(
    root: &'v Value,
    paths: &[FieldPath],
    accept: impl Fn(&'v Value) -> Option<T>,
) -> Option<T> {
    paths
        .iter()
        .filter_map(|path| get_path(root, path))
        .find_map(accept)
}

/// First non-empty string along `paths`.
pub fn lookup_str<'v>(root: &'v Value, paths: &[FieldPath]) -> Option<&'v str> {
    lookup(root, paths, |v| v.as_str().filter(|s| !s.is_empty()))
}

/// First tag list along `paths`.
///
/// Accepts an array (string items kept) or a comma-separated string.
pub fn lookup_tags(root: &Value, paths: &[FieldPath]) -> Option<Vec<String>> {
    lookup(root, paths, |v| match v {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|t| t.as_str())
                .map(str::to_string)
                .collect(),
        ),
        Value::String(s) if !s.trim().is_empty() => Some(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    })
}
