//! Batch upload pipeline: compression, NAS upload, and catalog persistence
//! for each file, with per-file outcome tracking.

pub mod compress;
pub mod error;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::store::{AlbumImage, AlbumStore, NewAlbumImage, StoreError};
use crate::syno::upload::is_supported_media;
use crate::syno::{UploadOrchestrator, UploadTarget};

pub use compress::{compress, CompressionSettings};
pub use error::UploadError;

/// Progress callback, invoked after each file with (completed, total).
/// UI-independent so callers can drive a progress bar, a log line, or nothing.
pub type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// One file queued for upload.
#[derive(Debug, Clone)]
pub struct FileJob {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A file that made it through upload and persistence.
#[derive(Debug)]
pub struct UploadedImage {
    pub filename: String,
    pub image: AlbumImage,
}

/// A file that failed at any stage. The rest of the batch is unaffected.
#[derive(Debug)]
pub struct FailedUpload {
    pub filename: String,
    pub error: UploadError,
}

/// Outcome of a whole batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<UploadedImage>,
    pub failed: Vec<FailedUpload>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct UploadPipeline {
    orchestrator: UploadOrchestrator,
    store: Arc<dyn AlbumStore>,
    settings: CompressionSettings,
}

impl UploadPipeline {
    pub fn new(
        orchestrator: UploadOrchestrator,
        store: Arc<dyn AlbumStore>,
        settings: CompressionSettings,
    ) -> Self {
        Self {
            orchestrator,
            store,
            settings,
        }
    }

    /// Upload a batch of files into one album, sequentially.
    ///
    /// Fails fast when the album is missing or soft-deleted; after that,
    /// per-file errors are collected rather than aborting the batch.
    pub async fn upload_batch(
        &self,
        files: Vec<FileJob>,
        target: &UploadTarget,
        album_id: &str,
        added_by: &str,
        progress: Option<&ProgressFn>,
    ) -> Result<BatchReport, UploadError> {
        match self.store.get_album(album_id).await? {
            Some(album) if album.is_active => {}
            _ => {
                return Err(UploadError::Persistence(StoreError::AlbumNotFound(
                    album_id.to_string(),
                )))
            }
        }

        let total = files.len();
        let mut report = BatchReport::default();

        for (idx, job) in files.into_iter().enumerate() {
            let filename = job.filename.clone();
            match self.upload_one(job, target, album_id, added_by).await {
                Ok(image) => {
                    debug!(filename = %filename, image_row = image.id, "file uploaded and recorded");
                    report.succeeded.push(UploadedImage { filename, image });
                }
                Err(error) => {
                    warn!(filename = %filename, %error, "file failed, continuing batch");
                    report.failed.push(FailedUpload { filename, error });
                }
            }
            if let Some(cb) = progress {
                cb(idx + 1, total);
            }
        }

        Ok(report)
    }

    async fn upload_one(
        &self,
        job: FileJob,
        target: &UploadTarget,
        album_id: &str,
        added_by: &str,
    ) -> Result<AlbumImage, UploadError> {
        if !is_supported_media(&job.filename) {
            return Err(UploadError::Validation(format!(
                "unsupported file type: {}",
                job.filename
            )));
        }

        let settings = self.settings;
        let bytes = job.bytes;
        let compressed = tokio::task::spawn_blocking(move || compress(&bytes, &settings))
            .await
            .map_err(StoreError::from)??;
        if compressed.is_recompressed() {
            debug!(
                filename = %job.filename,
                original_size = compressed.original_size,
                compressed_size = compressed.compressed_size,
                "file recompressed before upload"
            );
        }

        let result = self
            .orchestrator
            .upload(&compressed.bytes, &job.filename, target)
            .await?;

        let image = self
            .store
            .add_image(NewAlbumImage {
                album_id: album_id.to_string(),
                image_id: result.vendor_file_id.clone(),
                image_url: result.display_url,
                image_name: job.filename,
                thumbnail_url: result.thumbnail_url,
                vendor_file_id: Some(result.vendor_file_id),
                vendor_folder_id: result.folder_id,
                file_size: Some(compressed.original_size),
                compressed_size: Some(compressed.compressed_size),
                added_by: added_by.to_string(),
            })
            .await?;

        Ok(image)
    }
}
