//! Keyword highlighting endpoints.
//!
//! Handlers for running a highlight pass over an uploaded PDF and for
//! downloading the annotated copy it produced.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ProcessingError, ServiceError};

use super::{AppState, read_upload};

/// Summary and download handle for a completed highlight run
#[derive(Serialize)]
pub struct HighlightResponse {
    /// HTML fragment listing matching lines per page
    pub summary: String,
    pub matches: usize,
    pub download_id: Uuid,
    pub filename: String,
}

/// Highlight a keyword in the uploaded PDF
pub async fn highlight_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<HighlightResponse>, ServiceError> {
    let (file, fields) = read_upload(multipart).await?.require_file()?;
    let keyword = fields.get("keyword").cloned().unwrap_or_default();

    let result = state.service.highlight_keyword(file, keyword).await?;

    Ok(Json(HighlightResponse {
        summary: result.summary,
        matches: result.matches,
        download_id: result.download_id,
        filename: result.filename,
    }))
}

/// Serve a previously highlighted PDF as an attachment
pub async fn download_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let (path, filename) = state.service.download_path(id)?;

    let data = tokio::fs::read(&path)
        .await
        .map_err(ProcessingError::Io)?;

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                mime::APPLICATION_PDF.as_ref().to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        data,
    ))
}
