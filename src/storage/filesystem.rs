//! Folder provisioning
//!
//! Resolves and lazily creates the directory an upload is written into.

use log::{info, warn};
use std::fs;
use std::io;
use std::path::Path;

use crate::error::StorageError;
use crate::storage::results::ProvisionedFolder;
use crate::storage::validation::{is_contained, resolve_path, resolve_within};

/// Check if directory exists
pub fn directory_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Create a directory and its parents; an existing directory is not an error
fn create_directory(path: &Path) -> Result<(), StorageError> {
    if directory_exists(path) {
        return Ok(());
    }
    fs::create_dir_all(path)?;
    info!("Created {} folder", path.display());
    Ok(())
}

/// Ensure the upload folder exists under `root` and return it.
///
/// An empty or missing `requested` folder selects the root itself. A folder
/// resolving outside the root is rejected before anything is created.
pub fn provision_folder(
    root: &Path,
    requested: Option<&str>,
) -> Result<ProvisionedFolder, StorageError> {
    create_directory(root)?;

    let resolved_root = resolve_path(root).ok_or_else(|| {
        StorageError::IoError(io::Error::other(format!(
            "Cannot resolve upload folder {}",
            root.display()
        )))
    })?;

    let folder = requested.unwrap_or_default();
    if folder.is_empty() {
        return Ok(ProvisionedFolder {
            path: resolved_root,
            relative: String::new(),
        });
    }

    let Some(target) = resolve_within(root, folder) else {
        warn!("Rejected upload folder {} outside {}", folder, root.display());
        return Err(StorageError::FolderNotAllowed(folder.to_string()));
    };

    create_directory(&target)?;

    // A symlink may have been swapped in while the tree was being created
    if !is_contained(&target, root) {
        warn!("Upload folder {} escaped {} after creation", folder, root.display());
        return Err(StorageError::FolderNotAllowed(folder.to_string()));
    }

    let relative = target
        .strip_prefix(&resolved_root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();

    Ok(ProvisionedFolder {
        path: target,
        relative,
    })
}
