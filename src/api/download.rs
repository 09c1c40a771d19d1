//! `GET /download/{filename}`: serve a file from the working directory.

use std::sync::Arc;

use axum::{
    extract::{Path as UrlPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::routes::AppState;
use crate::workspace::{secure_path, validate_file_type, PathError};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        let status = match &self {
            DownloadError::Path(PathError::InvalidName(_))
            | DownloadError::Path(PathError::DisallowedType(_)) => StatusCode::BAD_REQUEST,
            DownloadError::Path(PathError::OutsideWorkspace(_)) | DownloadError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            DownloadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Error downloading file: {}", self);
        } else {
            tracing::warn!("Download rejected: {}", self);
        }
        let body = match self {
            DownloadError::Io(_) => "Failed to read file".to_string(),
            other => other.to_string(),
        };
        (status, body).into_response()
    }
}

fn content_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" => "text/plain; charset=utf-8",
        "py" => "text/x-python; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        _ => "application/octet-stream",
    }
}

pub async fn download_file(
    State(state): State<Arc<AppState>>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, DownloadError> {
    if !validate_file_type(&filename) {
        return Err(PathError::DisallowedType(filename).into());
    }
    let path = secure_path(&state.config.working_directory, &filename)?;

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Err(DownloadError::NotFound(filename)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DownloadError::NotFound(filename));
        }
        Err(e) => return Err(e.into()),
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DownloadError::NotFound(filename));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("Serving download {} ({} bytes)", filename, bytes.len());

    let disposition = format!(
        "attachment; filename=\"{}\"",
        filename.replace(['"', '\\'], "_")
    );
    Ok((
        [
            (header::CONTENT_TYPE, content_type(&filename).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
