//! Error types
//!
//! Defines domain-specific error types for the storage layer and the server.

use axum::http::StatusCode;
use std::fmt;
use std::io;

/// Failure classes surfaced by the storage layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    PolicyRejected,
    AccessDenied,
    NotFound,
    StorageFault,
}

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    /// Structurally invalid upload input (empty name, no files)
    InvalidUpload(String),
    /// Extension not on the allow-list, carries the claimed name
    ExtensionNotAllowed(String),
    /// Requested sub-folder resolves outside the root
    FolderNotAllowed(String),
    /// Requested file path resolves outside the root
    PathTraversal(String),
    FileNotFound(String),
    /// Listing filter that can never match inside the root
    InvalidPattern(String),
    IoError(io::Error),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::InvalidUpload(_) | StorageError::InvalidPattern(_) => {
                ErrorKind::Validation
            }
            StorageError::ExtensionNotAllowed(_) => ErrorKind::PolicyRejected,
            StorageError::FolderNotAllowed(_) | StorageError::PathTraversal(_) => {
                ErrorKind::AccessDenied
            }
            StorageError::FileNotFound(_) => ErrorKind::NotFound,
            StorageError::IoError(_) => ErrorKind::StorageFault,
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidUpload(msg) => write!(f, "{}", msg),
            StorageError::ExtensionNotAllowed(name) => write!(f, "{} is not allowed", name),
            StorageError::FolderNotAllowed(folder) => {
                write!(f, "{} folder is not allowed!", folder)
            }
            StorageError::PathTraversal(p) => write!(f, "{} is not allowed!", p),
            // Clients match on this exact text
            StorageError::FileNotFound(_) => write!(f, "File doesn't exist"),
            StorageError::InvalidPattern(p) => write!(f, "Invalid filter: {}", p),
            StorageError::IoError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

/// General server error that encompasses all error types
#[derive(Debug)]
pub enum FileDropError {
    Storage(StorageError),
    Config(config::ConfigError),
    IoError(io::Error),
    /// Request refused before it reached the storage layer, carrying the status
    /// chosen by the layer that refused it
    Rejected(StatusCode, String),
    RouteNotFound(String),
    /// A blocking storage task panicked or was cancelled
    TaskFailed(String),
}

impl fmt::Display for FileDropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileDropError::Storage(e) => write!(f, "{}", e),
            FileDropError::Config(e) => write!(f, "Configuration error: {}", e),
            FileDropError::IoError(e) => write!(f, "{}", e),
            FileDropError::Rejected(_, msg) => write!(f, "{}", msg),
            FileDropError::RouteNotFound(path) => {
                write!(f, "The requested URL {} was not found on the server", path)
            }
            FileDropError::TaskFailed(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FileDropError {}

impl From<StorageError> for FileDropError {
    fn from(error: StorageError) -> Self {
        FileDropError::Storage(error)
    }
}

impl From<config::ConfigError> for FileDropError {
    fn from(error: config::ConfigError) -> Self {
        FileDropError::Config(error)
    }
}

impl From<io::Error> for FileDropError {
    fn from(error: io::Error) -> Self {
        FileDropError::IoError(error)
    }
}

impl From<tokio::task::JoinError> for FileDropError {
    fn from(error: tokio::task::JoinError) -> Self {
        FileDropError::TaskFailed(error.to_string())
    }
}
