//! Error handling
//!
//! Defines error types and handling for the file drop server.

pub mod handlers;
pub mod types;

pub use types::*;
