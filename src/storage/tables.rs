use redb::TableDefinition;

/// File records: uuid -> FileRecord (msgpack)
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Content hash index: sha256 hex -> uuid. One entry per distinct content.
pub const FILE_HASHES: TableDefinition<&str, &str> = TableDefinition::new("file_hashes");

/// Stored location index: `uploads/...` key -> uuid (for /uploads/ route lookups)
pub const FILE_LOCATIONS: TableDefinition<&str, &str> = TableDefinition::new("file_locations");
