//! Deduplicating file store.
//!
//! Uploads are hashed before any persistence decision is made. The store then
//! either bumps the reference count of the record that already holds that
//! content, or writes the bytes under a generated location and inserts a new
//! record. The database rejects a second record for the same hash, and the
//! store treats that rejection as "someone else created it first" and falls
//! back to the increment path.

pub mod location;

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use ring::digest;
use thiserror::Error;

use crate::object_store::{ObjectReader, ObjectStore, ObjectStoreError};
use crate::storage::{Database, DatabaseError, FileRecord, ListFilter};

pub const MAX_FILENAME_CHARS: usize = 255;
pub const MAX_CONTENT_TYPE_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("File not found")]
    NotFound,
    #[error("Object storage error: {0}")]
    Storage(#[from] ObjectStoreError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Result of an upload.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// Novel content; bytes were written and a record created.
    Created(FileRecord),
    /// Content already stored; its reference count was incremented and the
    /// uploaded bytes were discarded.
    Duplicate { record: FileRecord, bytes_saved: u64 },
}

impl UploadOutcome {
    pub fn record(&self) -> &FileRecord {
        match self {
            UploadOutcome::Created(record) => record,
            UploadOutcome::Duplicate { record, .. } => record,
        }
    }
}

/// Lowercase hex SHA-256 digest of `data`.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(digest::digest(&digest::SHA256, data).as_ref())
}

#[derive(Clone)]
pub struct FileStore {
    db: Database,
    objects: Arc<dyn ObjectStore>,
}

impl FileStore {
    pub fn new(db: Database, objects: Arc<dyn ObjectStore>) -> Self {
        Self { db, objects }
    }

    pub async fn upload(
        &self,
        content: Bytes,
        original_filename: &str,
        content_type: &str,
    ) -> Result<UploadOutcome, StoreError> {
        if content.is_empty() {
            return Err(StoreError::InvalidInput(
                "The submitted file is empty".to_string(),
            ));
        }
        if original_filename.chars().count() > MAX_FILENAME_CHARS {
            return Err(StoreError::InvalidInput(format!(
                "filename must be at most {MAX_FILENAME_CHARS} characters"
            )));
        }
        if content_type.chars().count() > MAX_CONTENT_TYPE_CHARS {
            return Err(StoreError::InvalidInput(format!(
                "content type must be at most {MAX_CONTENT_TYPE_CHARS} characters"
            )));
        }

        let hash = content_hash(&content);
        let size = content.len() as u64;

        if let Some(record) = self.db.increment_reference(&hash)? {
            tracing::debug!(
                file_id = %record.id,
                reference_count = record.reference_count,
                "Duplicate upload, reused existing content"
            );
            return Ok(UploadOutcome::Duplicate {
                record,
                bytes_saved: size,
            });
        }

        let location = location::generate(original_filename);
        self.objects.put(&location, content).await?;

        let record = FileRecord {
            id: uuid::Uuid::new_v4().to_string(),
            stored_location: location.clone(),
            original_filename: original_filename.to_string(),
            content_type: content_type.to_string(),
            size,
            uploaded_at: Utc::now(),
            content_hash: hash.clone(),
            reference_count: 1,
        };

        // A hash conflict means a concurrent upload stored this content first.
        // If that record is deleted before we reach it, the insert is retried.
        loop {
            match self.db.insert_file(&record) {
                Ok(()) => {
                    tracing::info!(
                        file_id = %record.id,
                        location = %record.stored_location,
                        size = record.size,
                        "Stored new file"
                    );
                    return Ok(UploadOutcome::Created(record));
                }
                Err(DatabaseError::HashConflict { existing_id }) => {
                    tracing::debug!(
                        existing_id = %existing_id,
                        "Concurrent upload created this content first"
                    );
                    match self.db.increment_reference(&hash) {
                        Ok(Some(existing)) => {
                            self.discard_blob(&location).await;
                            return Ok(UploadOutcome::Duplicate {
                                record: existing,
                                bytes_saved: size,
                            });
                        }
                        Ok(None) => continue,
                        Err(e) => {
                            self.discard_blob(&location).await;
                            return Err(e.into());
                        }
                    }
                }
                Err(e) => {
                    self.discard_blob(&location).await;
                    return Err(e.into());
                }
            }
        }
    }

    pub fn list(&self, filter: &ListFilter) -> Result<Vec<FileRecord>, StoreError> {
        Ok(self.db.list_files(filter)?)
    }

    pub fn get(&self, id: &str) -> Result<FileRecord, StoreError> {
        self.db.get_file(id)?.ok_or(StoreError::NotFound)
    }

    /// Delete a record and its bytes.
    ///
    /// Deletion is per record: a reference count above one is not consulted,
    /// every logical owner of the content loses it.
    pub async fn delete(&self, id: &str) -> Result<FileRecord, StoreError> {
        let file = self.get(id)?;

        if file.reference_count > 1 {
            tracing::warn!(
                file_id = %file.id,
                reference_count = file.reference_count,
                "Deleting file that is still referenced by other uploads"
            );
        }

        self.objects.delete(&file.stored_location).await?;

        match self.db.delete_file(id) {
            Ok(true) => {}
            Ok(false) => return Err(StoreError::NotFound),
            Err(e) => {
                tracing::error!(
                    file_id = %file.id,
                    location = %file.stored_location,
                    error = %e,
                    "Stored bytes removed but the file record could not be deleted"
                );
                return Err(e.into());
            }
        }

        tracing::info!(file_id = %file.id, location = %file.stored_location, "Deleted file");
        Ok(file)
    }

    /// Open a file's bytes for download.
    pub async fn open(&self, id: &str) -> Result<(FileRecord, ObjectReader), StoreError> {
        let file = self.get(id)?;
        let reader = self.open_blob(&file).await?;
        Ok((file, reader))
    }

    /// Open a file's bytes by stored location. Only indexed locations resolve.
    pub async fn open_by_location(
        &self,
        location: &str,
    ) -> Result<(FileRecord, ObjectReader), StoreError> {
        let file = self
            .db
            .get_file_by_location(location)?
            .ok_or(StoreError::NotFound)?;
        let reader = self.open_blob(&file).await?;
        Ok((file, reader))
    }

    async fn open_blob(&self, file: &FileRecord) -> Result<ObjectReader, StoreError> {
        match self.objects.open(&file.stored_location).await {
            Ok(reader) => Ok(reader),
            Err(ObjectStoreError::NotFound(_)) => {
                tracing::warn!(
                    file_id = %file.id,
                    location = %file.stored_location,
                    "File record has no stored bytes"
                );
                Err(StoreError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn discard_blob(&self, location: &str) {
        if let Err(e) = self.objects.delete(location).await {
            tracing::warn!(location = %location, error = %e, "Failed to remove unused blob");
        }
    }
}
