mod local;

pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
}

/// Readable handle over a stored object. The underlying resource is
/// released when the reader is dropped.
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Abstraction over blob storage backends.
/// Keys are generated by the service (`uploads/<uuid>.<ext>`), never taken
/// from client-supplied filenames.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError>;
    /// Open an object for streaming reads.
    async fn open(&self, key: &str) -> Result<ObjectReader, ObjectStoreError>;
    /// Remove an object. Removing a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
}
