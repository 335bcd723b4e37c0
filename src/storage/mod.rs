//! File system storage management
//!
//! Handles file operations, listings, naming rules and path containment for
//! everything stored under the upload root.

pub mod catalog;
pub mod filename;
pub mod filesystem;
pub mod operations;
pub mod permissions;
pub mod results;
pub mod upload;
pub mod validation;

// Re-export commonly used storage functions
pub use catalog::{DEFAULT_FILTER, DEFAULT_PAGE_LIMIT, ListingQuery, list_files};
pub use filename::sanitize_filename;
pub use filesystem::provision_folder;
pub use operations::{delete_file, open_file, save_file};
pub use permissions::ExtensionPolicy;
pub use results::{FetchedFile, ProvisionedFolder, SavedFile, StoredFileMeta};
pub use upload::{BufferedUpload, Upload};
pub use validation::{is_contained, resolve_within};
