//! Client-side image size bounding.
//!
//! Files at or under the byte threshold pass through byte-identical, so
//! running the stage twice never degrades an image further. Oversized files
//! are decoded, resized to the configured long edge, and re-encoded as JPEG
//! down a fixed quality ladder until they fit.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use super::error::UploadError;

/// JPEG qualities tried in order for an oversized image.
const QUALITY_LADDER: [u8; 6] = [85, 75, 65, 50, 40, 30];

/// After the quality ladder is exhausted, the long edge shrinks by 25% and
/// the ladder restarts, at most this many times.
const MAX_SHRINK_ROUNDS: u32 = 5;

/// Size bounds applied before upload.
#[derive(Debug, Clone, Copy)]
pub struct CompressionSettings {
    /// Files at or under this many bytes are passed through untouched.
    pub max_bytes: usize,
    /// Longest image dimension after compression, in pixels.
    pub max_long_edge: u32,
}

impl CompressionSettings {
    /// Default for album gallery uploads: 2 MiB, 1920 px.
    pub const GALLERY: Self = Self {
        max_bytes: 2 * 1024 * 1024,
        max_long_edge: 1920,
    };

    /// Looser bound for bulk file-share uploads: 5 MiB, 2560 px.
    pub const BULK: Self = Self {
        max_bytes: 5 * 1024 * 1024,
        max_long_edge: 2560,
    };
}

/// Output of the compression stage.
#[derive(Debug, Clone)]
pub struct CompressedFile {
    pub bytes: Vec<u8>,
    pub original_size: u64,
    pub compressed_size: u64,
}

impl CompressedFile {
    /// Whether the bytes were re-encoded (and are therefore JPEG).
    pub fn is_recompressed(&self) -> bool {
        self.compressed_size != self.original_size
    }
}

/// Bound an image to the settings. Within-budget input is returned unchanged.
pub fn compress(bytes: &[u8], settings: &CompressionSettings) -> Result<CompressedFile, UploadError> {
    let original_size = bytes.len() as u64;
    if bytes.len() <= settings.max_bytes {
        return Ok(CompressedFile {
            bytes: bytes.to_vec(),
            original_size,
            compressed_size: original_size,
        });
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| UploadError::Validation(format!("not a decodable image: {e}")))?;

    let mut long_edge = settings.max_long_edge;
    for round in 0..MAX_SHRINK_ROUNDS {
        // resize() fits within the bounding square and keeps the aspect ratio
        let scaled = if img.width().max(img.height()) > long_edge {
            img.resize(long_edge, long_edge, FilterType::Lanczos3)
        } else {
            img.clone()
        };
        let rgb = scaled.to_rgb8();

        for quality in QUALITY_LADDER {
            let mut out = Vec::new();
            let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| UploadError::Validation(format!("JPEG encoding failed: {e}")))?;

            if out.len() <= settings.max_bytes {
                tracing::debug!(
                    original_size,
                    compressed_size = out.len(),
                    quality,
                    round,
                    "image compressed"
                );
                let compressed_size = out.len() as u64;
                return Ok(CompressedFile {
                    bytes: out,
                    original_size,
                    compressed_size,
                });
            }
        }

        long_edge = (long_edge * 3 / 4).max(1);
    }

    Err(UploadError::Validation(format!(
        "oversized file after compression ({original_size} bytes exceeds {} even at minimum quality)",
        settings.max_bytes
    )))
}
