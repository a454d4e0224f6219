pub mod db;
mod files;
pub mod models;
mod tables;

pub use db::{Database, DatabaseError};
pub use models::{parse_size_range, FileRecord, ListFilter};
pub use tables::*;
