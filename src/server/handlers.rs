//! Route handlers
//!
//! Thin adapters between HTTP requests and the storage layer. Every storage
//! call runs on the blocking thread pool.

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use log::{debug, info};
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tokio_util::io::ReaderStream;

use crate::error::{FileDropError, StorageError};
use crate::server::core::AppState;
use crate::server::responses::{DeleteResponse, FileLink, ServiceInfo};
use crate::server::urls::file_url;
use crate::storage::{
    self, BufferedUpload, DEFAULT_FILTER, DEFAULT_PAGE_LIMIT, ListingQuery, SavedFile,
    StoredFileMeta,
};

/// Multipart part names carrying files
const FILE_FIELDS: [&str; 2] = ["file[]", "file"];
const FOLDER_FIELD: &str = "folder";

pub const SERVICE_NAME: &str = "File Uploader";

/// Listing parameters as sent on the query string
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FileQuery {
    pub filter: String,
    /// -1 (or any negative value) returns every file
    pub start: i64,
    pub limit: usize,
}

impl Default for FileQuery {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            start: -1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Multipart failures keep their own status, 413 for an oversized body
fn multipart_failure(e: MultipartError) -> FileDropError {
    FileDropError::Rejected(e.status(), e.body_text())
}

pub async fn index(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upload_folder: state.root.display().to_string(),
    })
}

pub async fn list_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<FileQuery>, QueryRejection>,
) -> Result<Json<Vec<FileLink>>, FileDropError> {
    let Query(query) = query.map_err(|e| FileDropError::Rejected(e.status(), e.body_text()))?;
    let listing = ListingQuery::from_raw(&query.filter, query.start, query.limit);

    let root = Arc::clone(&state.root);
    let files = spawn_blocking(move || {
        let files: Vec<StoredFileMeta> = storage::list_files(&root, &listing).collect();
        files
    })
    .await?;

    let base = state.urls.base_url(&headers);
    let links = files
        .iter()
        .map(|file| FileLink {
            name: file.name.clone(),
            url: file_url(&base, &file.relative_path()),
        })
        .collect();
    Ok(Json(links))
}

pub async fn upload_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<FileLink>>, FileDropError> {
    let mut uploads: Vec<BufferedUpload<Bytes>> = Vec::new();
    let mut folder: Option<String> = None;

    match multipart {
        Ok(mut multipart) => {
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(multipart_failure)?
            {
                let field_name = field.name().unwrap_or_default().to_string();
                if FILE_FIELDS.contains(&field_name.as_str()) {
                    // Parts without a filename are form values, not files
                    let Some(file_name) = field.file_name().map(str::to_string) else {
                        debug!("Ignoring {} part without a filename", field_name);
                        continue;
                    };
                    let data = field
                        .bytes()
                        .await
                        .map_err(multipart_failure)?;
                    uploads.push(BufferedUpload::new(file_name, data));
                } else if field_name == FOLDER_FIELD {
                    let value = field
                        .text()
                        .await
                        .map_err(multipart_failure)?;
                    folder = Some(value);
                }
            }
        }
        Err(e) => debug!("Upload body is not multipart: {}", e),
    }

    if uploads.is_empty() {
        return Err(StorageError::InvalidUpload("No file is selected!".into()).into());
    }

    let root = Arc::clone(&state.root);
    let policy = Arc::clone(&state.policy);
    let saved = spawn_blocking(move || -> Result<Vec<SavedFile>, StorageError> {
        let target = storage::provision_folder(&root, folder.as_deref())?;
        uploads
            .into_iter()
            .map(|upload| storage::save_file(&target, upload, &policy))
            .collect()
    })
    .await??;

    let base = state.urls.base_url(&headers);
    let links = saved
        .into_iter()
        .map(|file| {
            let url = file_url(&base, &file.relative_path);
            info!("Successfully uploaded {} file", url);
            FileLink {
                name: file.name,
                url,
            }
        })
        .collect();
    Ok(Json(links))
}

pub async fn get_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, FileDropError> {
    let root = Arc::clone(&state.root);
    let fetched = spawn_blocking(move || storage::open_file(&root, &path)).await??;

    let content_type = mime_guess::from_path(&fetched.path).first_or_octet_stream();
    let stream = ReaderStream::new(tokio::fs::File::from_std(fetched.file));

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, fetched.len.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<DeleteResponse>, FileDropError> {
    let root = Arc::clone(&state.root);
    spawn_blocking(move || storage::delete_file(&root, &path)).await??;
    Ok(Json(DeleteResponse { success: true }))
}

pub async fn not_found(uri: Uri) -> FileDropError {
    FileDropError::RouteNotFound(uri.path().to_string())
}

pub async fn method_not_allowed(method: Method, uri: Uri) -> FileDropError {
    FileDropError::Rejected(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("The method {} is not allowed for {}", method, uri.path()),
    )
}
