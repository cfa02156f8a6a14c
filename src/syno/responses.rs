//! Serde models for the NAS WebAPI response envelopes.
//!
//! Every endpoint wraps its payload in `{success, data?, error?}`; the data
//! shape varies per API generation, so payload structs keep every field
//! optional and let the caller decide what is required.

use serde::Deserialize;

/// The universal `{success, data, error}` envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> Envelope<T> {
    /// The vendor error code, defaulting to 100 ("unknown") when the NAS
    /// reports failure without a code.
    pub fn error_code(&self) -> i64 {
        self.error.as_ref().map(|e| e.code).unwrap_or(100)
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: i64,
}

/// Payload of the capability probe (`SYNO.API.Info`). The probe only checks
/// reachability, so the body is accepted as-is.
#[derive(Debug, Deserialize)]
pub struct InfoData {}

/// Payload of a successful `SYNO.API.Auth` login.
#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub sid: String,
}

/// Payload of a successful upload. The FileStation generation reports the
/// stored file name (and whether a duplicate was skipped); the Photos
/// generation reports a numeric item id.
#[derive(Debug, Deserialize)]
pub struct UploadData {
    pub id: Option<i64>,
    pub file: Option<String>,
    #[serde(rename = "blSkip")]
    pub skipped: Option<bool>,
}
