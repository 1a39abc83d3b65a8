//! Question answering endpoint.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ServiceError;

use super::{AppState, read_upload};

/// Model answer for a question about an uploaded PDF
#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Answer a question against the uploaded PDF's text
pub async fn ask_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AskResponse>, ServiceError> {
    let (file, fields) = read_upload(multipart).await?.require_file()?;
    let question = fields.get("question").cloned().unwrap_or_default();

    let answer = state.service.answer_question(file, question).await?;
    Ok(Json(AskResponse { answer }))
}
