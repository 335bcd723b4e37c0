//! Storage operations
//!
//! Save, fetch and delete for files under the upload root. Every path is
//! checked for containment before the filesystem is touched.

use log::{error, info, warn};
use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::StorageError;
use crate::storage::filename::sanitize_filename;
use crate::storage::permissions::ExtensionPolicy;
use crate::storage::results::{FetchedFile, ProvisionedFolder, SavedFile};
use crate::storage::upload::Upload;
use crate::storage::validation::resolve_within;

/// Stores an upload in a provisioned folder.
///
/// The content is written to a temporary file beside the target and renamed
/// into place, so a failed or interrupted write never leaves a partial file
/// under the final name. An existing file with the same name is replaced.
pub fn save_file<U: Upload>(
    folder: &ProvisionedFolder,
    upload: U,
    policy: &ExtensionPolicy,
) -> Result<SavedFile, StorageError> {
    let claimed = upload.name().to_string();
    if claimed.is_empty() {
        return Err(StorageError::InvalidUpload("File is not selected".into()));
    }

    let name = sanitize_filename(&claimed);
    if name.is_empty() {
        return Err(StorageError::InvalidUpload(format!("{} is not a valid file name", claimed)));
    }
    if !policy.is_allowed(&name) {
        warn!("Rejected upload {} by extension policy", claimed);
        return Err(StorageError::ExtensionNotAllowed(claimed));
    }

    let target = folder.path().join(&name);
    let mut stream = upload.open_stream()?;
    let mut temp_file = NamedTempFile::new_in(folder.path())?;
    let size = io::copy(&mut stream, &mut temp_file)?;
    temp_file.as_file().sync_all()?;

    temp_file.persist(&target).map_err(|e| {
        error!("Failed to store {}: {}", target.display(), e.error);
        StorageError::IoError(e.error)
    })?;

    let relative_path = folder.relative_file(&name);
    info!("Stored {} as {} ({} bytes)", claimed, relative_path, size);

    Ok(SavedFile {
        name,
        relative_path,
        size,
    })
}

/// Resolve a root-relative path, rejecting anything outside the root.
///
/// Hidden names are reported as missing, which also covers uploads still
/// being written to their temporary file.
fn resolve_file_path(root: &Path, relative: &str) -> Result<PathBuf, StorageError> {
    if relative.is_empty() {
        return Err(StorageError::FileNotFound(relative.to_string()));
    }
    let path = resolve_within(root, relative).ok_or_else(|| {
        warn!("Rejected access to {} outside {}", relative, root.display());
        StorageError::PathTraversal(relative.to_string())
    })?;

    let hidden = path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'));
    if hidden {
        return Err(StorageError::FileNotFound(relative.to_string()));
    }
    Ok(path)
}

/// Opens a stored file for reading
pub fn open_file(root: &Path, relative: &str) -> Result<FetchedFile, StorageError> {
    let path = resolve_file_path(root, relative)?;

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StorageError::FileNotFound(relative.to_string()));
        }
        Err(e) => {
            error!("Failed to open {}: {}", path.display(), e);
            return Err(StorageError::from(e));
        }
    };

    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(StorageError::FileNotFound(relative.to_string()));
    }

    info!("Serving {} ({} bytes)", relative, metadata.len());
    Ok(FetchedFile {
        file,
        len: metadata.len(),
        path,
    })
}

/// Deletes a stored file
pub fn delete_file(root: &Path, relative: &str) -> Result<(), StorageError> {
    let path = resolve_file_path(root, relative)?;

    match fs::metadata(&path) {
        Ok(metadata) if metadata.is_file() => {}
        Ok(_) => return Err(StorageError::FileNotFound(relative.to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StorageError::FileNotFound(relative.to_string()));
        }
        Err(e) => return Err(StorageError::from(e)),
    }

    match fs::remove_file(&path) {
        Ok(()) => {
            info!("Successfully deleted {} file", relative);
            Ok(())
        }
        // Removed concurrently between the check and the unlink
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(StorageError::FileNotFound(relative.to_string()))
        }
        Err(e) => {
            error!("Failed to delete {} (real: {}): {}", relative, path.display(), e);
            Err(StorageError::from(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as FailureKind;
    use crate::storage::filesystem::provision_folder;
    use crate::storage::upload::BufferedUpload;
    use std::io::Read;
    use tempfile::TempDir;

    fn read_back(root: &Path, relative: &str) -> Vec<u8> {
        let mut fetched = open_file(root, relative).unwrap();
        let mut content = Vec::new();
        fetched.file.read_to_end(&mut content).unwrap();
        assert_eq!(fetched.len, content.len() as u64);
        content
    }

    #[test]
    fn test_save_then_fetch_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let folder = provision_folder(root, None).unwrap();

        let saved = save_file(
            &folder,
            BufferedUpload::new("test.py", b"pass".to_vec()),
            &ExtensionPolicy::allow_all(),
        )
        .unwrap();

        assert_eq!(saved.name, "test.py");
        assert_eq!(saved.relative_path, "test.py");
        assert_eq!(saved.size, 4);
        assert_eq!(read_back(root, "test.py"), b"pass");
    }

    #[test]
    fn test_save_into_folder_uses_sanitized_name() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let folder = provision_folder(root, Some("test")).unwrap();

        let saved = save_file(
            &folder,
            BufferedUpload::new("../my notes.txt", b"hello".to_vec()),
            &ExtensionPolicy::allow_all(),
        )
        .unwrap();

        assert_eq!(saved.name, "my_notes.txt");
        assert_eq!(saved.relative_path, "test/my_notes.txt");
        assert_eq!(read_back(root, "test/my_notes.txt"), b"hello");
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let folder = provision_folder(root, None).unwrap();
        let policy = ExtensionPolicy::allow_all();

        save_file(&folder, BufferedUpload::new("a.txt", b"first".to_vec()), &policy).unwrap();
        save_file(&folder, BufferedUpload::new("a.txt", b"second".to_vec()), &policy).unwrap();

        assert_eq!(read_back(root, "a.txt"), b"second");
        assert_eq!(fs::read_dir(root).unwrap().count(), 1);
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let folder = provision_folder(temp_dir.path(), None).unwrap();
        let policy = ExtensionPolicy::allow_all();

        let err = save_file(&folder, BufferedUpload::new("", Vec::new()), &policy).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(err.to_string(), "File is not selected");

        let err = save_file(&folder, BufferedUpload::new("..", Vec::new()), &policy).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_extension_policy_is_enforced() {
        let temp_dir = TempDir::new().unwrap();
        let folder = provision_folder(temp_dir.path(), None).unwrap();
        let policy = ExtensionPolicy::parse(".png");

        let err = save_file(&folder, BufferedUpload::new("test.py", b"pass".to_vec()), &policy)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::PolicyRejected);
        assert_eq!(err.to_string(), "test.py is not allowed");

        let saved =
            save_file(&folder, BufferedUpload::new("IMAGE.PNG", b"png".to_vec()), &policy)
                .unwrap();
        assert_eq!(saved.name, "IMAGE.PNG");
    }

    #[test]
    fn test_delete_is_final() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let folder = provision_folder(root, None).unwrap();
        save_file(
            &folder,
            BufferedUpload::new("test.py", b"pass".to_vec()),
            &ExtensionPolicy::allow_all(),
        )
        .unwrap();

        delete_file(root, "test.py").unwrap();

        let err = open_file(root, "test.py").unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
        let err = delete_file(root, "test.py").unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
        assert_eq!(err.to_string(), "File doesn't exist");
    }

    #[test]
    fn test_directories_are_not_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("test")).unwrap();

        assert_eq!(open_file(root, "test").unwrap_err().kind(), FailureKind::NotFound);
        assert_eq!(delete_file(root, "test").unwrap_err().kind(), FailureKind::NotFound);
        assert!(root.join("test").is_dir());
    }

    #[test]
    fn test_in_flight_uploads_cannot_be_fetched_or_deleted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let folder = provision_folder(root, Some("test")).unwrap();

        let mut in_flight = NamedTempFile::new_in(folder.path()).unwrap();
        io::Write::write_all(&mut in_flight, b"partial").unwrap();
        let name = in_flight.path().file_name().unwrap().to_string_lossy().into_owned();
        let relative = folder.relative_file(&name);

        let err = open_file(root, &relative).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
        let err = delete_file(root, &relative).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
        assert!(in_flight.path().exists());

        fs::write(root.join(".env"), "secret").unwrap();
        assert_eq!(open_file(root, ".env").unwrap_err().kind(), FailureKind::NotFound);
    }

    #[test]
    fn test_paths_outside_root_are_denied() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(temp_dir.path().join("secret.txt"), "secret").unwrap();

        let err = open_file(&root, "../secret.txt").unwrap_err();
        assert_eq!(err.kind(), FailureKind::AccessDenied);
        let err = delete_file(&root, "../secret.txt").unwrap_err();
        assert_eq!(err.kind(), FailureKind::AccessDenied);
        assert!(temp_dir.path().join("secret.txt").exists());
    }
}
