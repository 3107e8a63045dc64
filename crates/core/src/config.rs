//! Configuration types shared across crates.

use crate::{DEFAULT_MAX_FILE_SIZE, DEFAULT_RESERVED_MARGIN};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Blob storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one blob per file id.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./data/files")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

/// Metadata store configuration (SQLite).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Database file path.
    #[serde(default = "default_metadata_path")]
    pub path: PathBuf,
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("./data/metadata.db")
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            path: default_metadata_path(),
        }
    }
}

/// Storage admission limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum declared file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Free-space buffer kept unavailable to uploads, protecting the host
    /// from disk exhaustion by metadata and transient overhead.
    #[serde(default = "default_reserved_margin")]
    pub reserved_margin_bytes: u64,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_reserved_margin() -> u64 {
    DEFAULT_RESERVED_MARGIN
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            reserved_margin_bytes: default_reserved_margin(),
        }
    }
}

impl LimitsConfig {
    /// Validate limit invariants.
    ///
    /// Declared sizes are persisted as SQLite INTEGER (i64), so the ceiling
    /// must fit that range.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_file_size_bytes == 0 {
            return Err("limits.max_file_size_bytes cannot be 0".to_string());
        }
        if self.max_file_size_bytes > i64::MAX as u64 {
            return Err(format!(
                "limits.max_file_size_bytes {} exceeds maximum value {}",
                self.max_file_size_bytes,
                i64::MAX
            ));
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Admission limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Callers are expected to point `storage.root`
    /// and `metadata.path` at temporary locations.
    pub fn for_testing() -> Self {
        Self::default()
    }
}
