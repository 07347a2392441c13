//! Asset path resolution and identifier containment.
//!
//! Stored paths (avatars, group images) are published as URLs under
//! [`ASSETS_PREFIX`], relative to the data root. Only files inside the
//! public subtrees are published; anything else, including symlinks that
//! resolve outside their root, is treated as missing.

use std::path::{Component, Path, PathBuf};

use crate::error::{LibraryError, Result};

/// URL namespace for published files.
pub const ASSETS_PREFIX: &str = "/assets/";

/// Subdirectories of the data root whose files may be published.
pub const PUBLIC_DIRS: [&str; 3] = ["characters", "avatars", "groups"];

/// Maps stored relative paths to published asset URLs.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    data_root: PathBuf,
    secondary_root: Option<PathBuf>,
}

impl AssetResolver {
    /// Create a resolver publishing files under `data_root`.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            secondary_root: None,
        }
    }

    /// Builder: a second root searched when the data root has no match.
    pub fn with_secondary_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.secondary_root = Some(root.into());
        self
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Resolve `relative` (either separator convention) to a published URL.
    ///
    /// The data root is tried first, then the secondary root. A match in the
    /// secondary root is published relative to the data root, so it must
    /// also live beneath it. Returns `None` when nothing resolves.
    pub fn resolve(&self, relative: &str) -> Option<String> {
        let relative = clean_relative(relative)?;
        let primary = self.data_root.canonicalize().ok()?;
        let found = locate(&primary, &relative)
            .filter(|found| self.is_public(&primary, found))
            .or_else(|| {
                let secondary = self.secondary_root.as_ref()?.canonicalize().ok()?;
                locate(&secondary, &relative)
            })?;
        url_relative_to(&primary, &found)
    }

    /// File behind a published URL, given the part after [`ASSETS_PREFIX`].
    ///
    /// Only existing files inside a public subtree (or the secondary root)
    /// are returned, after following symlinks.
    pub fn published_file(&self, relative: &str) -> Option<PathBuf> {
        let relative = clean_relative(relative)?;
        let primary = self.data_root.canonicalize().ok()?;
        locate(&primary, &relative).filter(|found| self.is_public(&primary, found))
    }

    /// Published URL of a file known to live under the data root.
    ///
    /// Purely lexical: no filesystem access.
    pub fn published_url(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.data_root).ok()?;
        asset_url(relative)
    }

    /// Whether a canonical path under `primary` lies in a published subtree.
    fn is_public(&self, primary: &Path, found: &Path) -> bool {
        let secondary = self
            .secondary_root
            .as_ref()
            .and_then(|root| root.canonicalize().ok());
        PUBLIC_DIRS
            .iter()
            .filter_map(|dir| primary.join(dir).canonicalize().ok())
            .chain(secondary)
            .any(|dir| found.starts_with(dir))
    }
}

fn clean_relative(relative: &str) -> Option<String> {
    let relative = relative.replace('\\', "/");
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        None
    } else {
        Some(relative.to_string())
    }
}

/// Canonical path of `root/relative` if it is an existing file inside `root`.
fn locate(canonical_root: &Path, relative: &str) -> Option<PathBuf> {
    let candidate = canonical_root.join(relative).canonicalize().ok()?;
    if candidate.starts_with(canonical_root) && candidate.is_file() {
        Some(candidate)
    } else {
        None
    }
}

fn url_relative_to(canonical_root: &Path, path: &Path) -> Option<String> {
    asset_url(path.strip_prefix(canonical_root).ok()?)
}

/// Build `/assets/a/b/c` from a relative path made only of plain components.
fn asset_url(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(format!("{}{}", ASSETS_PREFIX, parts.join("/")))
}

/// Join a caller-supplied identifier onto `root`, rejecting traversal.
///
/// Absolute paths, drive prefixes and `..` components fail with
/// [`LibraryError::BadPath`] before any I/O. The joined path then goes
/// through [`confine`].
pub fn contain(root: &Path, id: &str) -> Result<PathBuf> {
    let normalized = id.replace('\\', "/");
    let relative = Path::new(&normalized);

    let mut has_name = false;
    for component in relative.components() {
        match component {
            Component::Normal(_) => has_name = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(LibraryError::BadPath(id.to_string()));
            }
        }
    }
    if !has_name {
        return Err(LibraryError::BadPath(id.to_string()));
    }
    confine(root, root.join(relative))
}

/// Reject an existing `path` whose canonical form leaves `root`.
///
/// Paths that do not exist are returned as-is; the caller's read reports
/// them as missing.
pub fn confine(root: &Path, path: PathBuf) -> Result<PathBuf> {
    let canonical = match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(_) => return Ok(path),
    };
    match root.canonicalize() {
        Ok(root) if canonical.starts_with(&root) => Ok(path),
        _ => Err(LibraryError::BadPath(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("avatars")).unwrap();
        fs::write(dir.path().join("avatars").join("ann.png"), b"img").unwrap();
        dir
    }

    #[test]
    fn test_resolve_existing_file() {
        let dir = fixture();
        let resolver = AssetResolver::new(dir.path());
        assert_eq!(
            resolver.resolve("avatars/ann.png").as_deref(),
            Some("/assets/avatars/ann.png")
        );
    }

    #[test]
    fn test_resolve_backslash_separators() {
        let dir = fixture();
        let resolver = AssetResolver::new(dir.path());
        assert_eq!(
            resolver.resolve("avatars\\ann.png").as_deref(),
            Some("/assets/avatars/ann.png")
        );
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = fixture();
        let resolver = AssetResolver::new(dir.path().join("avatars"));
        assert_eq!(resolver.resolve("../../etc/passwd"), None);
        assert_eq!(resolver.resolve("../avatars/ann.png"), None);
        assert_eq!(resolver.resolve("/etc/passwd"), None);
    }

    #[test]
    fn test_resolve_missing_and_empty() {
        let dir = fixture();
        let resolver = AssetResolver::new(dir.path());
        assert_eq!(resolver.resolve("avatars/nobody.png"), None);
        assert_eq!(resolver.resolve(""), None);
        assert_eq!(resolver.resolve("avatars"), None);
    }

    #[test]
    fn test_resolve_through_secondary_root() {
        let dir = fixture();
        let group_files = dir.path().join("group files");
        fs::create_dir_all(&group_files).unwrap();
        fs::write(group_files.join("crew.png"), b"img").unwrap();

        let resolver = AssetResolver::new(dir.path()).with_secondary_root(&group_files);
        assert_eq!(
            resolver.resolve("crew.png").as_deref(),
            Some("/assets/group files/crew.png")
        );
    }

    #[test]
    fn test_secondary_root_outside_data_root_is_not_published() {
        let data = fixture();
        let elsewhere = tempfile::tempdir().unwrap();
        fs::write(elsewhere.path().join("crew.png"), b"img").unwrap();

        let resolver = AssetResolver::new(data.path()).with_secondary_root(elsewhere.path());
        assert_eq!(resolver.resolve("crew.png"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escaping_root_is_rejected() {
        let data = fixture();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"s").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            data.path().join("avatars").join("link.png"),
        )
        .unwrap();

        let resolver = AssetResolver::new(data.path());
        assert_eq!(resolver.resolve("avatars/link.png"), None);
    }

    #[test]
    fn test_published_url_is_lexical() {
        let resolver = AssetResolver::new("/data/user");
        let path = Path::new("/data/user/characters/Ann.png");
        assert_eq!(
            resolver.published_url(path).as_deref(),
            Some("/assets/characters/Ann.png")
        );
        assert_eq!(resolver.published_url(Path::new("/other/Ann.png")), None);
    }

    #[test]
    fn test_contain_accepts_plain_ids() {
        let root = Path::new("/data/characters");
        assert_eq!(
            contain(root, "bob.json").unwrap(),
            PathBuf::from("/data/characters/bob.json")
        );
        assert_eq!(
            contain(root, "Foo\\lorebook.json").unwrap(),
            PathBuf::from("/data/characters/Foo/lorebook.json")
        );
    }

    #[test]
    fn test_contain_rejects_traversal() {
        let root = Path::new("/data/characters");
        for id in ["../settings.json", "a/../../b", "/etc/passwd", "..\\x", "", "."] {
            assert!(
                matches!(contain(root, id), Err(LibraryError::BadPath(_))),
                "id {:?} should be rejected",
                id
            );
        }
    }

    #[test]
    fn test_private_files_are_not_published() {
        let dir = fixture();
        fs::write(dir.path().join("settings.json"), b"{}").unwrap();
        fs::write(dir.path().join("secrets.json"), b"{}").unwrap();
        let resolver = AssetResolver::new(dir.path());

        assert_eq!(resolver.resolve("settings.json"), None);
        assert_eq!(resolver.published_file("secrets.json"), None);
        assert_eq!(resolver.published_file("../secrets.json"), None);
        assert!(resolver.published_file("avatars/ann.png").is_some());
        assert!(resolver.published_file("avatars\\ann.png").is_some());
    }

    #[test]
    fn test_published_file_in_secondary_root() {
        let dir = fixture();
        let group_files = dir.path().join("group files");
        fs::create_dir_all(&group_files).unwrap();
        fs::write(group_files.join("crew.png"), b"img").unwrap();

        let resolver = AssetResolver::new(dir.path()).with_secondary_root(&group_files);
        assert!(resolver.published_file("group files/crew.png").is_some());
        assert_eq!(AssetResolver::new(dir.path()).published_file("group files/crew.png"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_published_file_rejects_escaping_symlink() {
        let data = fixture();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"s").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            data.path().join("avatars").join("link.png"),
        )
        .unwrap();
        // A public-looking link to a private file inside the root.
        fs::write(data.path().join("secrets.json"), b"{}").unwrap();
        std::os::unix::fs::symlink(
            data.path().join("secrets.json"),
            data.path().join("avatars").join("keys.png"),
        )
        .unwrap();

        let resolver = AssetResolver::new(data.path());
        assert_eq!(resolver.published_file("avatars/link.png"), None);
        assert_eq!(resolver.published_file("avatars/keys.png"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_contain_rejects_symlink_escape() {
        let data = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("card.json"), b"{}").unwrap();
        let root = data.path().join("characters");
        fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(outside.path().join("card.json"), root.join("evil.json"))
            .unwrap();
        fs::write(root.join("good.json"), b"{}").unwrap();

        assert!(matches!(contain(&root, "evil.json"), Err(LibraryError::BadPath(_))));
        assert_eq!(contain(&root, "good.json").unwrap(), root.join("good.json"));
        assert_eq!(contain(&root, "ghost.json").unwrap(), root.join("ghost.json"));
    }
}
