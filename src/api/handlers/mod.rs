mod admin;
mod files;
mod static_files;

pub use admin::health;
pub use files::{create_file, delete_file, download_file, get_file, list_files};
pub use static_files::serve_upload;

/// Build a `Content-Disposition` value that is safe to put in a header.
///
/// Control characters are dropped. The quoted `filename` is an ASCII
/// fallback; names that needed changing also get an RFC 5987 `filename*`.
fn content_disposition(disposition: &str, filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();

    if fallback == filename {
        return format!("{disposition}; filename=\"{fallback}\"");
    }

    let cleaned: String = filename.chars().filter(|c| !c.is_control()).collect();
    format!(
        "{disposition}; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(&cleaned)
    )
}
