//! Page text extraction endpoint.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::pdf::text::PageText;

use super::{AppState, read_upload};

/// Per-page text of an uploaded PDF
#[derive(Serialize)]
pub struct ExtractResponse {
    pub pages: Vec<PageText>,
}

/// Extract text from each page of the uploaded PDF
pub async fn extract_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, ServiceError> {
    let (file, _) = read_upload(multipart).await?.require_file()?;

    let pages = state.service.extract_pages(file).await?;
    Ok(Json(ExtractResponse { pages }))
}
