//! Error handlers
//!
//! Maps errors onto HTTP status codes and logs them.

use crate::error::types::{ErrorKind, FileDropError, StorageError};
use axum::http::StatusCode;
use log::{error, warn};

/// Log an error at a level matching its severity
pub fn handle_error(err: &FileDropError) {
    let status = error_to_status(err);
    if status.is_server_error() {
        error!("Request failed ({}): {}", status.as_u16(), err);
    } else {
        warn!("Request rejected ({}): {}", status.as_u16(), err);
    }
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &FileDropError) -> StatusCode {
    match err {
        FileDropError::Storage(e) => storage_error_to_status(e),
        FileDropError::Rejected(status, _) => *status,
        FileDropError::RouteNotFound(_) => StatusCode::NOT_FOUND,
        FileDropError::Config(_) | FileDropError::IoError(_) | FileDropError::TaskFailed(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn storage_error_to_status(err: &StorageError) -> StatusCode {
    match err {
        // Folder rejection stays a 400 for clients that display the message verbatim
        StorageError::FolderNotAllowed(_) => StatusCode::BAD_REQUEST,
        StorageError::PathTraversal(_) => StatusCode::FORBIDDEN,
        other => match other.kind() {
            ErrorKind::Validation | ErrorKind::PolicyRejected => StatusCode::BAD_REQUEST,
            ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::StorageFault => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_storage_errors_map_to_client_codes() {
        let cases = [
            (StorageError::InvalidUpload("File is not selected".into()), 400),
            (StorageError::ExtensionNotAllowed("x.py".into()), 400),
            (StorageError::FolderNotAllowed("../x".into()), 400),
            (StorageError::PathTraversal("../x".into()), 403),
            (StorageError::FileNotFound("x".into()), 404),
        ];
        for (err, code) in cases {
            assert_eq!(error_to_status(&FileDropError::from(err)).as_u16(), code);
        }
    }

    #[test]
    fn test_rejections_keep_their_status() {
        let err = FileDropError::Rejected(StatusCode::PAYLOAD_TOO_LARGE, "too large".into());
        assert_eq!(error_to_status(&err), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_string(), "too large");

        let err = FileDropError::Rejected(StatusCode::METHOD_NOT_ALLOWED, "no".into());
        assert_eq!(error_to_status(&err).as_u16(), 405);
    }

    #[test]
    fn test_io_failure_is_internal() {
        let err = FileDropError::from(StorageError::from(io::Error::other("disk full")));
        assert_eq!(error_to_status(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_messages_echo_offending_input() {
        let err = StorageError::FolderNotAllowed("../../test".into());
        assert_eq!(err.to_string(), "../../test folder is not allowed!");
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        assert_eq!(
            StorageError::FileNotFound("a.txt".into()).to_string(),
            "File doesn't exist"
        );
    }
}
