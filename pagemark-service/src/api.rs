//! HTTP API for the Pagemark service.
//!
//! This module provides the REST API endpoints for:
//! - Health monitoring
//! - Page text extraction
//! - Keyword highlighting and annotated-PDF download
//! - Question answering

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    response::Html,
    routing::{get, post},
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ServiceError, ServiceResult};
use crate::service::PagemarkService;

pub mod extract;
pub mod highlight;
pub mod qa;
use extract::extract_handler;
use highlight::{download_handler, highlight_handler};
use qa::ask_handler;

/// Application state
pub struct AppState {
    pub service: Arc<PagemarkService>,
    pub start_time: Instant,
}

/// Build the API router
pub fn router(service: Arc<PagemarkService>) -> Router {
    let max_body_size = service.config.limits.max_upload_size_bytes as usize;

    let state = Arc::new(AppState {
        service,
        start_time: Instant::now(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Upload endpoints carry a larger body limit
        .route(
            "/extract",
            post(extract_handler).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route(
            "/highlight",
            post(highlight_handler).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route(
            "/ask",
            post(ask_handler).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/downloads/{id}", get(download_handler));

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Static page ===

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

// === Health ===

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let chat_available = state.service.chat.health_check().await;

    let status = if chat_available {
        "healthy".to_string()
    } else {
        "degraded: chat backend unavailable".to_string()
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        chat_available,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    chat_available: bool,
}

// === Multipart helpers ===

/// Fields collected from a multipart upload
pub(crate) struct UploadFields {
    pub file: Option<Vec<u8>>,
    pub text_fields: HashMap<String, String>,
}

/// Drain a multipart request into its file payload and text fields
pub(crate) async fn read_upload(mut multipart: Multipart) -> ServiceResult<UploadFields> {
    let mut file: Option<Vec<u8>> = None;
    let mut text_fields = HashMap::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let data = field
                .bytes()
                .await
                .map_err(|e| ServiceError::InvalidRequest {
                    message: e.to_string(),
                })?;
            file = Some(data.to_vec());
        } else if !name.is_empty() {
            let value = field
                .text()
                .await
                .map_err(|e| ServiceError::InvalidRequest {
                    message: e.to_string(),
                })?;
            text_fields.insert(name, value);
        }
    }

    Ok(UploadFields { file, text_fields })
}

impl UploadFields {
    /// The uploaded file, or an invalid-request error naming the field
    pub fn require_file(self) -> ServiceResult<(Vec<u8>, HashMap<String, String>)> {
        let Some(file) = self.file else {
            return Err(ServiceError::InvalidRequest {
                message: "No file provided in 'file' field".to_string(),
            });
        };
        Ok((file, self.text_fields))
    }
}
