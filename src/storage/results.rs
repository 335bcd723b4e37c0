//! Storage result types
//!
//! Defines result structures returned by storage operations.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Join root-relative segments with `/`, skipping an empty folder
pub(crate) fn join_relative(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Target directory of an upload, validated and created under the root
#[derive(Debug, Clone)]
pub struct ProvisionedFolder {
    /// Absolute, resolved directory
    pub path: PathBuf,
    /// Folder relative to the root with `/` separators, empty for the root itself
    pub relative: String,
}

impl ProvisionedFolder {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root-relative path of a file stored in this folder
    pub fn relative_file(&self, name: &str) -> String {
        join_relative(&self.relative, name)
    }
}

/// Listing entry for a stored file
#[derive(Debug, Clone)]
pub struct StoredFileMeta {
    /// Base name
    pub name: String,
    /// Folder relative to the root, empty for files directly under it
    pub folder: String,
    pub modified: SystemTime,
}

impl StoredFileMeta {
    pub fn relative_path(&self) -> String {
        join_relative(&self.folder, &self.name)
    }
}

/// Result of a file save operation
#[derive(Debug, Clone)]
pub struct SavedFile {
    /// Sanitized name the file was stored under
    pub name: String,
    /// Root-relative path, suitable for building a download URL
    pub relative_path: String,
    pub size: u64,
}

/// Result of a file fetch operation
#[derive(Debug)]
pub struct FetchedFile {
    pub file: File,
    pub len: u64,
    pub path: PathBuf,
}
