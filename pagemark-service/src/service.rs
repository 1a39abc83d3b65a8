//! Service coordinator.
//!
//! Owns the chat client, the configuration, and the in-memory registry of
//! highlighted PDFs awaiting download. PDF work runs on the blocking
//! thread pool; every upload is staged into its own temp dir.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tempfile::TempDir;
use tracing::info;
use uuid::Uuid;

use crate::chat::ChatClient;
use crate::config::StaticConfig;
use crate::error::{ProcessingError, ServiceError, ServiceResult};
use crate::highlight;
use crate::pdf::text::{PageText, extract_page_texts};
use crate::qa;

/// A highlighted PDF held for download.
///
/// The temp dir keeps the file on disk until the entry is dropped.
struct DownloadEntry {
    path: PathBuf,
    filename: String,
    created_at: Instant,
    _dir: TempDir,
}

/// Response data for a completed highlight run
pub struct HighlightResult {
    pub summary: String,
    pub matches: usize,
    pub download_id: Uuid,
    pub filename: String,
}

/// Main service coordinator
pub struct PagemarkService {
    pub config: StaticConfig,
    pub chat: ChatClient,
    downloads: DashMap<Uuid, DownloadEntry>,
}

impl PagemarkService {
    /// Create a new service instance
    pub fn new(config: StaticConfig) -> ServiceResult<Self> {
        let chat = ChatClient::new(config.chat.clone())?;

        Ok(Self {
            config,
            chat,
            downloads: DashMap::new(),
        })
    }

    /// Extract per-page text from an uploaded PDF
    pub async fn extract_pages(&self, data: Vec<u8>) -> ServiceResult<Vec<PageText>> {
        let (dir, path) = self.stage_upload(&data)?;

        run_blocking(move || {
            let pages = extract_page_texts(&path);
            drop(dir);
            pages
        })
        .await
    }

    /// Highlight a keyword in an uploaded PDF and register the annotated
    /// copy for download
    pub async fn highlight_keyword(
        &self,
        data: Vec<u8>,
        keyword: String,
    ) -> ServiceResult<HighlightResult> {
        let (dir, path) = self.stage_upload(&data)?;

        let outcome = run_blocking(move || {
            let outcome = highlight::highlight_keyword(&path, &keyword);
            drop(dir);
            outcome
        })
        .await?;

        let download_id = Uuid::new_v4();
        let filename = "highlighted.pdf".to_string();
        self.downloads.insert(
            download_id,
            DownloadEntry {
                path: outcome.output_path,
                filename: filename.clone(),
                created_at: Instant::now(),
                _dir: outcome.output_dir,
            },
        );

        info!(%download_id, matches = outcome.matches, "Highlighted PDF registered for download");

        Ok(HighlightResult {
            summary: outcome.summary,
            matches: outcome.matches,
            download_id,
            filename,
        })
    }

    /// Answer a free-form question about an uploaded PDF
    pub async fn answer_question(&self, data: Vec<u8>, question: String) -> ServiceResult<String> {
        if question.trim().is_empty() {
            return Ok(qa::EMPTY_QUESTION_MESSAGE.to_string());
        }

        let pages = self.extract_pages(data).await?;
        if pages.is_empty() {
            return Err(ProcessingError::NoExtractableText.into());
        }

        qa::answer(
            &self.chat,
            &pages,
            &question,
            self.config.chat.context_char_budget,
        )
        .await
    }

    /// Look up a registered download
    pub fn download_path(&self, id: Uuid) -> ServiceResult<(PathBuf, String)> {
        let entry = self
            .downloads
            .get(&id)
            .ok_or_else(|| ServiceError::DownloadNotFound {
                download_id: id.to_string(),
            })?;

        Ok((entry.path.clone(), entry.filename.clone()))
    }

    /// Drop download entries older than the configured TTL, returning how
    /// many were removed
    pub fn cleanup_downloads(&self) -> usize {
        let ttl = Duration::from_secs(self.config.limits.download_ttl_secs);
        let before = self.downloads.len();
        self.downloads
            .retain(|_, entry| entry.created_at.elapsed() < ttl);
        before - self.downloads.len()
    }

    /// Validate an upload and write it into its own temp dir
    fn stage_upload(&self, data: &[u8]) -> ServiceResult<(TempDir, PathBuf)> {
        let max = self.config.limits.max_upload_size_bytes;
        if data.len() as u64 > max {
            return Err(ProcessingError::FileTooLarge {
                size: data.len() as u64,
                max,
            }
            .into());
        }

        if !data.starts_with(b"%PDF-") {
            return Err(ProcessingError::UnsupportedFormat {
                format: "missing %PDF header".to_string(),
            }
            .into());
        }

        let dir = tempfile::tempdir().map_err(ProcessingError::Io)?;
        let path = dir.path().join("upload.pdf");
        std::fs::write(&path, data).map_err(ProcessingError::Io)?;

        Ok((dir, path))
    }
}

/// Run PDF work on the blocking thread pool
async fn run_blocking<T, F>(f: F) -> ServiceResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal {
            message: format!("blocking task failed: {}", e),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PagemarkService {
        PagemarkService::new(StaticConfig {
            server: Default::default(),
            chat: Default::default(),
            limits: Default::default(),
        })
        .expect("service")
    }

    #[tokio::test]
    async fn non_pdf_uploads_are_rejected() {
        let err = service()
            .extract_pages(b"PK\x03\x04 this is a zip".to_vec())
            .await
            .expect_err("non-PDF must be rejected");

        assert!(matches!(
            err,
            ServiceError::Processing(ProcessingError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn oversized_uploads_are_rejected() {
        let mut svc = service();
        svc.config.limits.max_upload_size_bytes = 16;

        let err = svc
            .extract_pages(b"%PDF-1.5 and quite a lot more".to_vec())
            .await
            .expect_err("oversized upload must be rejected");

        assert!(matches!(
            err,
            ServiceError::Processing(ProcessingError::FileTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn blank_question_never_touches_the_upload() {
        // Deliberately invalid bytes: the blank-question check runs first
        let reply = service()
            .answer_question(b"not a pdf".to_vec(), "   ".to_string())
            .await
            .expect("blank question short-circuits");

        assert_eq!(reply, qa::EMPTY_QUESTION_MESSAGE);
    }

    #[tokio::test]
    async fn unknown_download_ids_are_not_found() {
        let err = service()
            .download_path(Uuid::new_v4())
            .expect_err("unknown id");

        assert!(matches!(err, ServiceError::DownloadNotFound { .. }));
    }
}
