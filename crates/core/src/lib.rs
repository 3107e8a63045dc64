//! Core domain types and shared logic for the depot file store.
//!
//! This crate defines the canonical data model used across all other crates:
//! - File identifiers and their encoding
//! - File views and request payloads
//! - Configuration types
//! - Core error taxonomy

pub mod config;
pub mod error;
pub mod file;
pub mod id;

pub use config::{AppConfig, LimitsConfig, MetadataConfig, ServerConfig, StorageConfig};
pub use error::{Error, Result};
pub use file::{CreateFileRequest, DeleteFileResponse, FileView, RenameFileRequest};
pub use id::FileId;

/// Number of random bytes behind a file identifier (~2^40 id space).
pub const FILE_ID_BYTES: usize = 5;

/// Default maximum declared file size: 8 GiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 8 * 1024 * 1024 * 1024;

/// Default free-space margin kept unavailable to uploads: 100 MiB.
pub const DEFAULT_RESERVED_MARGIN: u64 = 100 * 1024 * 1024;

/// Maximum accepted display-name length in bytes.
pub const MAX_FILE_NAME_LEN: usize = 255;
