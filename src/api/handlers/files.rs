use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use super::content_disposition;
use crate::api::response::{ApiError, AppQuery, JSend, JSendPaginated, Pagination};
use crate::storage::{parse_size_range, FileRecord, ListFilter};
use crate::store::UploadOutcome;
use crate::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const DEFAULT_FILENAME: &str = "upload";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: String,
    /// URL path serving the stored bytes
    pub file: String,
    pub original_filename: String,
    pub file_type: String,
    pub size: u64,
    pub uploaded_at: String,
    pub file_hash: String,
    pub reference_count: u64,
}

#[derive(Debug, Serialize)]
pub struct DuplicateFileResponse {
    pub message: String,
    pub file: FileResponse,
    pub storage_saved: u64,
}

/// Query parameters for listing. Filter values are kept as raw strings so a
/// malformed value disables that filter instead of failing the request.
#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub size_range: Option<String>,
    #[serde(default)]
    pub min_size: Option<String>,
    #[serde(default)]
    pub max_size: Option<String>,
    /// Only files uploaded within this many days
    #[serde(default)]
    pub date_range: Option<String>,
}

impl ListFilesParams {
    fn filter(&self) -> ListFilter {
        ListFilter {
            content_type_contains: non_empty(&self.file_type),
            size_range: non_empty(&self.size_range).and_then(|v| parse_size_range(&v)),
            search: non_empty(&self.search),
            min_size: parse_lenient(&self.min_size),
            max_size: parse_lenient(&self.max_size),
            uploaded_after: parse_lenient::<i64>(&self.date_range)
                .filter(|days| *days > 0)
                .and_then(Duration::try_days)
                .and_then(|window| Utc::now().checked_sub_signed(window)),
        }
    }

    fn page_size(&self, default: u32, max: u32) -> u32 {
        match parse_lenient::<u32>(&self.page_size) {
            Some(0) | None => default,
            Some(size) => size.min(max),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_lenient<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut file_data: Option<Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut file_content_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            // Ignore unknown fields
            continue;
        }

        file_name = field.file_name().map(|s| s.to_string());
        file_content_type = field.content_type().map(|s| s.to_string());

        let data = field.bytes().await.map_err(multipart_error)?;

        if data.len() as u64 > state.config.max_upload_size {
            return Err(ApiError::payload_too_large(format!(
                "File exceeds maximum upload size of {} bytes",
                state.config.max_upload_size
            )));
        }

        file_data = Some(data);
    }

    let file_data = file_data.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let file_name = file_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    // Determine MIME type: from multipart Content-Type, or guess from filename, or fallback
    let content_type = file_content_type
        .filter(|ct| ct != DEFAULT_CONTENT_TYPE)
        .or_else(|| mime_guess::from_path(&file_name).first().map(|m| m.to_string()))
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let outcome = state
        .store
        .upload(file_data, &file_name, &content_type)
        .await?;

    let response = match outcome {
        UploadOutcome::Created(record) => (
            StatusCode::CREATED,
            JSend::success(file_to_response(&record)),
        )
            .into_response(),
        UploadOutcome::Duplicate {
            record,
            bytes_saved,
        } => (
            StatusCode::OK,
            JSend::success(DuplicateFileResponse {
                message: "File already exists".to_string(),
                file: file_to_response(&record),
                storage_saved: bytes_saved,
            }),
        )
            .into_response(),
    };

    Ok(response)
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let file = state.store.get(&id)?;
    Ok(JSend::success(file_to_response(&file)))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<JSendPaginated<FileResponse>>, ApiError> {
    let page = params.page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::bad_request("page must be greater than 0"));
    }

    let limits = &state.config.pagination;
    let page_size = params.page_size(limits.default_page_size, limits.max_page_size);

    let files = state.store.list(&params.filter())?;
    let pagination = Pagination::new(page, page_size, files.len() as u64);

    let items: Vec<FileResponse> = files
        .iter()
        .skip(pagination.offset())
        .take(page_size as usize)
        .map(file_to_response)
        .collect();

    Ok(JSendPaginated::success(items, pagination))
}

/// Stream a file's bytes as an attachment named after the original upload.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (file, reader) = state.store.open(&id).await?;

    let body = Body::from_stream(ReaderStream::new(reader));
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        file.content_type
            .parse()
            .unwrap_or(HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.size));
    if let Ok(value) = content_disposition("attachment", &file.original_filename).parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

// ============================================================================
// Helpers
// ============================================================================

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(format!("Upload too large: {}", e.body_text()))
    } else {
        ApiError::bad_request(format!("Invalid multipart data: {}", e.body_text()))
    }
}

fn file_to_response(file: &FileRecord) -> FileResponse {
    FileResponse {
        id: file.id.clone(),
        file: format!("/{}", file.stored_location),
        original_filename: file.original_filename.clone(),
        file_type: file.content_type.clone(),
        size: file.size,
        uploaded_at: file.uploaded_at.to_rfc3339(),
        file_hash: file.content_hash.clone(),
        reference_count: file.reference_count,
    }
}
