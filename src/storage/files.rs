use std::cmp::Ordering;

use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{FileRecord, ListFilter};
use super::tables::*;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Insert a new file record together with its hash and location index
    /// entries.
    ///
    /// Both indexes are checked inside the same write transaction, so a
    /// concurrent insert of the same content fails here with
    /// [`DatabaseError::HashConflict`] instead of producing a second record.
    /// Nothing is written when an error is returned.
    pub fn insert_file(&self, file: &FileRecord) -> Result<(), DatabaseError> {
        debug_assert!(!file.id.is_empty(), "file id must not be empty");
        debug_assert!(
            !file.content_hash.is_empty(),
            "file content hash must not be empty"
        );

        let write_txn = self.begin_write()?;
        {
            let mut hash_table = write_txn.open_table(FILE_HASHES)?;
            let existing_id = hash_table
                .get(file.content_hash.as_str())?
                .map(|v| v.value().to_string());
            if let Some(existing_id) = existing_id {
                return Err(DatabaseError::HashConflict { existing_id });
            }

            let mut location_table = write_txn.open_table(FILE_LOCATIONS)?;
            if location_table.get(file.stored_location.as_str())?.is_some() {
                return Err(DatabaseError::LocationConflict(
                    file.stored_location.clone(),
                ));
            }

            let mut table = write_txn.open_table(FILES)?;
            let data = rmp_serde::to_vec_named(file)?;
            table.insert(file.id.as_str(), data.as_slice())?;
            hash_table.insert(file.content_hash.as_str(), file.id.as_str())?;
            location_table.insert(file.stored_location.as_str(), file.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a file by its UUID
    pub fn get_file(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(id)? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// Get a file by its stored location (resolves location -> uuid -> file)
    pub fn get_file_by_location(
        &self,
        location: &str,
    ) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let location_table = read_txn.open_table(FILE_LOCATIONS)?;

        let id = match location_table.get(location)? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        let files_table = read_txn.open_table(FILES)?;
        match files_table.get(id.as_str())? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Increment the reference count of the file holding `hash`.
    ///
    /// Lookup and update happen in one write transaction. Returns the updated
    /// record, or `None` when no file has this hash. A hash entry whose record
    /// is gone is dropped so the content can be inserted again.
    pub fn increment_reference(&self, hash: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let updated = {
            let mut hash_table = write_txn.open_table(FILE_HASHES)?;
            let id = hash_table.get(hash)?.map(|v| v.value().to_string());

            match id {
                Some(id) => {
                    let mut table = write_txn.open_table(FILES)?;
                    let existing: Option<FileRecord> = match table.get(id.as_str())? {
                        Some(data) => Some(rmp_serde::from_slice(data.value())?),
                        None => None,
                    };

                    match existing {
                        Some(mut file) => {
                            file.reference_count += 1;
                            let data = rmp_serde::to_vec_named(&file)?;
                            table.insert(id.as_str(), data.as_slice())?;
                            Some(file)
                        }
                        None => {
                            hash_table.remove(hash)?;
                            None
                        }
                    }
                }
                None => None,
            }
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a file by its UUID and clean up the hash and location indexes
    pub fn delete_file(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing: Option<FileRecord> = {
            let table = write_txn.open_table(FILES)?;
            let result = match table.get(id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };
            result
        };

        let deleted = match existing {
            Some(file) => {
                {
                    let mut table = write_txn.open_table(FILES)?;
                    table.remove(id)?;
                }
                {
                    let mut hash_table = write_txn.open_table(FILE_HASHES)?;
                    hash_table.remove(file.content_hash.as_str())?;
                }
                {
                    let mut location_table = write_txn.open_table(FILE_LOCATIONS)?;
                    location_table.remove(file.stored_location.as_str())?;
                }
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// Get all files in storage order
    pub fn get_all_files(&self) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        let mut files = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let file: FileRecord = rmp_serde::from_slice(value.value())?;
            files.push(file);
        }

        Ok(files)
    }

    /// List files matching `filter`, newest upload first
    pub fn list_files(&self, filter: &ListFilter) -> Result<Vec<FileRecord>, DatabaseError> {
        let mut files: Vec<FileRecord> = self
            .get_all_files()?
            .into_iter()
            .filter(|f| filter.matches(f))
            .collect();

        files.sort_by(newest_first);
        Ok(files)
    }
}

fn newest_first(a: &FileRecord, b: &FileRecord) -> Ordering {
    b.uploaded_at
        .cmp(&a.uploaded_at)
        .then_with(|| a.id.cmp(&b.id))
}
