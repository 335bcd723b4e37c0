//! Storage catalog
//!
//! Lists stored files matching a glob filter, oldest first, with optional
//! pagination. The filesystem is re-read on every call.

use globset::{GlobBuilder, GlobMatcher};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::StorageError;
use crate::storage::results::{StoredFileMeta, join_relative};
use crate::storage::validation::is_contained;

pub const DEFAULT_FILTER: &str = "*";
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Filter and page bounds for a listing
#[derive(Debug, Clone)]
pub struct ListingQuery {
    /// Glob pattern, one segment per folder level below the root
    pub filter: String,
    /// First entry to return; `None` returns every match
    pub start: Option<usize>,
    /// Maximum number of entries returned when `start` is set
    pub limit: usize,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            start: None,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl ListingQuery {
    /// Build a query from wire values, where a negative start means "all"
    pub fn from_raw(filter: &str, start: i64, limit: usize) -> Self {
        Self {
            filter: filter.to_string(),
            start: usize::try_from(start).ok(),
            limit,
        }
    }
}

/// One compiled pattern segment
struct SegmentMatcher {
    matcher: GlobMatcher,
    /// Hidden entries only match segments that start with a dot
    matches_hidden: bool,
}

impl SegmentMatcher {
    fn is_match(&self, name: &str) -> bool {
        (self.matches_hidden || !name.starts_with('.')) && self.matcher.is_match(name)
    }
}

fn compile_filter(filter: &str) -> Result<Vec<SegmentMatcher>, StorageError> {
    let filter = if filter.trim().is_empty() {
        DEFAULT_FILTER
    } else {
        filter
    };
    if filter.starts_with('/') || filter.starts_with('\\') {
        return Err(StorageError::InvalidPattern(filter.to_string()));
    }

    let segments: Vec<&str> = filter.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| *s == "..") {
        return Err(StorageError::InvalidPattern(filter.to_string()));
    }

    segments
        .into_iter()
        .map(|segment| {
            let glob = GlobBuilder::new(segment)
                .literal_separator(true)
                .build()
                .map_err(|e| StorageError::InvalidPattern(format!("{}: {}", filter, e)))?;
            Ok(SegmentMatcher {
                matcher: glob.compile_matcher(),
                matches_hidden: segment.starts_with('.'),
            })
        })
        .collect()
}

/// Walk one directory level per pattern segment and collect matching files
fn collect_matches(root: &Path, filter: &str) -> Result<Vec<StoredFileMeta>, StorageError> {
    let segments = compile_filter(filter)?;
    let mut frontier: Vec<(PathBuf, String)> = vec![(root.to_path_buf(), String::new())];
    let mut files = Vec::new();

    for (depth, segment) in segments.iter().enumerate() {
        let last = depth + 1 == segments.len();
        let mut next = Vec::new();

        for (dir, folder) in frontier {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    if depth == 0 {
                        return Err(StorageError::from(e));
                    }
                    continue;
                }
            };

            for entry in entries.flatten() {
                // Names that are not UTF-8 cannot be addressed by URL
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if !segment.is_match(&name) {
                    continue;
                }

                let path = entry.path();
                let Ok(metadata) = fs::metadata(&path) else {
                    continue;
                };
                if !is_contained(&path, root) {
                    warn!("Skipping {} outside {}", path.display(), root.display());
                    continue;
                }

                if last && metadata.is_file() {
                    files.push(StoredFileMeta {
                        name,
                        folder: folder.clone(),
                        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                    });
                } else if !last && metadata.is_dir() {
                    let child_folder = join_relative(&folder, &name);
                    next.push((path, child_folder));
                }
            }
        }
        frontier = next;
    }

    Ok(files)
}

/// List stored files under `root` matching `query`.
///
/// Entries are sorted by modification time, oldest first; entries with equal
/// timestamps keep directory enumeration order. Never fails: an unreadable
/// root or an unusable filter yields an empty listing.
pub fn list_files(
    root: &Path,
    query: &ListingQuery,
) -> impl Iterator<Item = StoredFileMeta> + use<> {
    info!("Filtering files with {} at {}", query.filter, root.display());

    let mut files = match collect_matches(root, &query.filter) {
        Ok(files) => files,
        Err(e) => {
            warn!("Listing {} with {} failed: {}", root.display(), query.filter, e);
            Vec::new()
        }
    };
    files.sort_by_key(|file| file.modified);

    let (skip, take) = match query.start {
        Some(start) => {
            info!(
                "Starting with {}. file and returning {} files",
                start, query.limit
            );
            (start, query.limit)
        }
        None => (0, usize::MAX),
    };

    files.into_iter().skip(skip).take(take)
}
