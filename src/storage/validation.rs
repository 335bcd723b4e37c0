//! Path validation
//!
//! Containment checks for every path the server touches. A path is contained
//! when, after following symlinks and collapsing `.`/`..`, it lies at or below
//! the root. Paths that do not exist yet are resolved as far as they exist and
//! the remaining segments are applied lexically.

use log::debug;
use soft_canonicalize::soft_canonicalize;
use std::fs;
use std::path::{Path, PathBuf};

/// Check whether `candidate` resolves to a location at or below `root`.
///
/// The comparison is made on whole path segments, so `/data-evil` is not
/// inside `/data`. Any resolution failure counts as not contained.
pub fn is_contained(candidate: &Path, root: &Path) -> bool {
    match (resolve_path(root), resolve_path(candidate)) {
        (Some(root), Some(candidate)) => candidate.starts_with(&root),
        _ => false,
    }
}

/// Join a client-supplied relative path onto `root` and return the resolved
/// location, or `None` if it escapes the root.
pub fn resolve_within(root: &Path, relative: &str) -> Option<PathBuf> {
    let resolved_root = resolve_path(root)?;
    let resolved = resolve_path(&root.join(relative))?;
    resolved.starts_with(&resolved_root).then_some(resolved)
}

/// Resolve a path to an absolute form without requiring it to exist.
///
/// Returns `None` when resolution fails, and when the path runs through a
/// dangling symlink, whose target cannot be verified.
pub fn resolve_path(path: &Path) -> Option<PathBuf> {
    if has_dangling_link(path) {
        debug!("Refusing to resolve {} through a dangling link", path.display());
        return None;
    }
    soft_canonicalize(path).ok()
}

fn has_dangling_link(path: &Path) -> bool {
    path.ancestors().any(|ancestor| {
        fs::symlink_metadata(ancestor).is_ok_and(|meta| meta.file_type().is_symlink())
            && fs::metadata(ancestor).is_err()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_root_contains_itself_and_children() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("file.txt"), "x").unwrap();

        assert!(is_contained(root, root));
        assert!(is_contained(&root.join("file.txt"), root));
        assert!(is_contained(&root.join("not/yet/created.txt"), root));
        assert!(is_contained(&root.join("a/../b"), root));
    }

    #[test]
    fn test_parent_segments_escape() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir(&root).unwrap();

        assert!(!is_contained(&root.join(".."), &root));
        assert!(!is_contained(&root.join("../../test"), &root));
        assert!(!is_contained(&root.join("missing/../../outside"), &root));
        assert!(!is_contained(Path::new("/etc/passwd"), &root));
    }

    #[test]
    fn test_sibling_with_shared_prefix_is_not_contained() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("data");
        let sibling = temp_dir.path().join("data-evil");
        fs::create_dir(&root).unwrap();
        fs::create_dir(&sibling).unwrap();

        assert!(!is_contained(&sibling, &root));
        assert!(!is_contained(&sibling.join("x.txt"), &root));
        assert!(!is_contained(&root.join("../data-evil/x.txt"), &root));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_root_is_rejected() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        let outside = temp_dir.path().join("outside");
        fs::create_dir(&root).unwrap();
        fs::create_dir(&outside).unwrap();
        symlink(&outside, root.join("escape")).unwrap();
        symlink(temp_dir.path().join("nowhere"), root.join("dangling")).unwrap();

        assert!(!is_contained(&root.join("escape"), &root));
        assert!(!is_contained(&root.join("escape/new.txt"), &root));
        assert!(!is_contained(&root.join("dangling"), &root));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_is_allowed() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("real")).unwrap();
        symlink(root.join("real"), root.join("alias")).unwrap();

        assert!(is_contained(&root.join("alias/file.txt"), root));
    }

    #[test]
    fn test_resolve_within() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("test")).unwrap();

        let resolved = resolve_within(root, "test/./file.txt").unwrap();
        assert!(resolved.ends_with("test/file.txt"));
        assert!(resolve_within(root, "../file.txt").is_none());
        assert!(resolve_within(root, "/etc/passwd").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_paths_below_dangling_link_do_not_resolve() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        symlink(root.join("gone"), root.join("dangling")).unwrap();

        assert!(resolve_path(&root.join("dangling")).is_none());
        assert!(resolve_path(&root.join("dangling/child.txt")).is_none());
        assert!(resolve_within(root, "dangling/child.txt").is_none());
        assert!(resolve_path(&root.join("fresh/child.txt")).is_some());
    }
}
