//! dedup-file-store - A file upload service that deduplicates stored content
//!
//! This crate provides file upload, listing, download and deletion with:
//! - Content deduplication by SHA-256 hash, with a per-file reference count
//! - redb embedded database for metadata (ACID, MVCC, crash-safe)
//! - Blob storage behind the `ObjectStore` trait (local filesystem)
//! - REST API with multipart upload support

pub mod api;
pub mod config;
pub mod object_store;
pub mod storage;
pub mod store;
#[cfg(test)]
pub mod testutil;

use config::Config;
use store::FileStore;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub store: FileStore,
}
