use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Main service error type
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Download not found: {download_id}")]
    DownloadNotFound { download_id: String },

    #[error("{0}")]
    Chat(#[from] ChatError),

    #[error("{0}")]
    Processing(#[from] ProcessingError),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Chat completion client errors.
///
/// Every variant's display message starts with the same prefix so callers
/// surfacing the message to users get a consistent label.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Chat completion request failed: could not reach {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Chat completion request failed (status {status}): {message}")]
    Completion { status: u16, message: String },

    #[error("Chat completion request failed: invalid response: {message}")]
    InvalidResponse { message: String },
}

/// PDF processing errors
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Failed to open PDF: {message}")]
    PdfOpen { message: String },

    #[error("Failed to extract text from page {page}: {message}")]
    TextExtraction { page: u32, message: String },

    #[error("No text could be extracted from the PDF")]
    NoExtractableText,

    #[error("Failed to write highlight annotations")]
    Annotation(#[source] lopdf::Error),

    #[error("Unsupported file format: {format}")]
    UnsupportedFormat { format: String },

    #[error("File too large: {size} bytes (max {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("IO error")]
    Io(#[source] std::io::Error),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::DownloadNotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Chat(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Processing(ProcessingError::UnsupportedFormat { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ServiceError::Processing(ProcessingError::FileTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ServiceError::Processing(
                ProcessingError::PdfOpen { .. } | ProcessingError::NoExtractableText,
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::DownloadNotFound { .. } => "download_not_found",
            ServiceError::Chat(ChatError::Connection { .. }) => "chat_connection",
            ServiceError::Chat(ChatError::Completion { .. }) => "chat_completion",
            ServiceError::Chat(ChatError::InvalidResponse { .. }) => "chat_invalid_response",
            ServiceError::Processing(ProcessingError::PdfOpen { .. }) => "pdf_open_error",
            ServiceError::Processing(ProcessingError::TextExtraction { .. }) => {
                "text_extraction_error"
            }
            ServiceError::Processing(ProcessingError::NoExtractableText) => "no_extractable_text",
            ServiceError::Processing(ProcessingError::Annotation(_)) => "annotation_error",
            ServiceError::Processing(ProcessingError::UnsupportedFormat { .. }) => {
                "unsupported_format"
            }
            ServiceError::Processing(ProcessingError::FileTooLarge { .. }) => "file_too_large",
            ServiceError::Processing(ProcessingError::Io(_)) => "io_error",
            ServiceError::InvalidRequest { .. } => "invalid_request",
            ServiceError::Config { .. } => "config_error",
            ServiceError::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().to_string();

        let response = ErrorResponse {
            message: self.to_string(),
            code: Some(code),
        };

        (status, Json(response)).into_response()
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
