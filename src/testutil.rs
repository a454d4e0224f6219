//! Shared test helpers for in-crate router tests.

use std::sync::Arc;

use crate::config::{Config, PaginationConfig, ServerConfig, StorageConfig};
use crate::object_store::LocalStore;
use crate::storage::Database;
use crate::store::FileStore;
use crate::AppState;

pub const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Create a test AppState with a temporary database and local object store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let media_root = temp_dir.path().join("media");

    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            cors_allowed_origins: Vec::new(),
        },
        storage: StorageConfig {
            data_dir: data_dir.to_string_lossy().to_string(),
            media_root: media_root.to_string_lossy().to_string(),
        },
        pagination: PaginationConfig::default(),
        max_upload_size: 1024 * 1024, // 1MB for tests
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let objects = LocalStore::new(&media_root).expect("Failed to create test object store");

    Arc::new(AppState {
        config,
        store: FileStore::new(db, Arc::new(objects)),
    })
}

/// Build a multipart body with a single `file` part.
pub fn multipart_body(filename: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Build a multipart body with a single text field and no file.
pub fn multipart_text_body(name: &str, value: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n--{BOUNDARY}--\r\n"
    )
    .into_bytes()
}
