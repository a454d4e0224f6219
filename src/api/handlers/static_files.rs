use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use super::content_disposition;
use crate::api::response::ApiError;
use crate::store::location::UPLOAD_PREFIX;
use crate::AppState;

/// Serve stored bytes by their location, the URL exposed as a record's `file`.
/// Route: GET /uploads/*key
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let location = format!("{UPLOAD_PREFIX}/{}", key.trim_start_matches('/'));
    let (file, reader) = state.store.open_by_location(&location).await?;

    let body = Body::from_stream(ReaderStream::new(reader));
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        file.content_type
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.size));

    if let Ok(value) = content_disposition("inline", &file.original_filename).parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Content at a location never changes; deletion removes the location.
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );

    Ok(response)
}
