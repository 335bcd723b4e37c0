//! HTTP server
//!
//! Routes, handlers and response shapes exposing the storage layer over HTTP.

pub mod core;
pub mod handlers;
pub mod responses;
pub mod urls;

pub use self::core::{AppState, Server, build_router};
