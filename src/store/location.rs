//! Generated storage locations for uploaded blobs.

use std::path::Path;

/// Namespace every blob key lives under.
pub const UPLOAD_PREFIX: &str = "uploads";

const MAX_EXTENSION_LEN: usize = 10;

/// Generate a fresh, unique storage location for an upload.
///
/// The key is a random UUID under [`UPLOAD_PREFIX`]. The only part taken from
/// the client filename is its extension, and only when it is short plain
/// ASCII alphanumerics, so the key can never contain separators or `..`.
pub fn generate(original_filename: &str) -> String {
    let id = uuid::Uuid::new_v4();
    match extension(original_filename) {
        Some(ext) => format!("{UPLOAD_PREFIX}/{id}.{ext}"),
        None => format!("{UPLOAD_PREFIX}/{id}"),
    }
}

fn extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}
