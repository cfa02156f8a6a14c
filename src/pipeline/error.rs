//! Error type for the upload pipeline.

use thiserror::Error;

use crate::store::StoreError;
use crate::syno::{ErrorCategory, SynoError};

/// Per-file and batch-level upload failures, flattened to the categories a
/// caller can act on.
#[derive(Debug, Error)]
pub enum UploadError {
    /// No NAS endpoint was reachable, even after failover.
    #[error("NAS unreachable: {0}")]
    Connectivity(String),

    /// Login was rejected, or a session could not be re-established.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The NAS accepted the request but refused it with a structured code.
    #[error("NAS rejected the upload ({}, code {code}): {message}", category.as_str())]
    Vendor {
        code: i64,
        category: ErrorCategory,
        message: String,
    },

    /// The file is unusable: unsupported type, undecodable, or still over
    /// the size limit after every compression round.
    #[error("invalid file: {0}")]
    Validation(String),

    /// The upload succeeded but recording it in the catalog failed.
    #[error("catalog write failed: {0}")]
    Persistence(StoreError),
}

impl From<StoreError> for UploadError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidInput(msg) => UploadError::Validation(msg),
            other => UploadError::Persistence(other),
        }
    }
}

impl From<SynoError> for UploadError {
    fn from(e: SynoError) -> Self {
        match e {
            SynoError::Connectivity { .. } | SynoError::BadResponse(_) | SynoError::Http(_) => {
                UploadError::Connectivity(e.to_string())
            }
            SynoError::Auth { .. } => UploadError::Authentication(e.to_string()),
            SynoError::Vendor {
                code,
                category,
                message,
            } => UploadError::Vendor {
                code,
                category,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syno::SessionFamily;

    #[test]
    fn test_store_invalid_input_becomes_validation() {
        let e: UploadError = StoreError::InvalidInput("empty name".into()).into();
        assert!(matches!(e, UploadError::Validation(_)));
    }

    #[test]
    fn test_store_other_becomes_persistence() {
        let e: UploadError = StoreError::AlbumNotFound("x".into()).into();
        assert!(matches!(e, UploadError::Persistence(_)));
    }

    #[test]
    fn test_syno_mapping() {
        let e: UploadError = SynoError::Connectivity { tried: 2 }.into();
        assert!(matches!(e, UploadError::Connectivity(_)));

        let e: UploadError = SynoError::Auth {
            family: SessionFamily::Foto,
            reason: "denied".into(),
        }
        .into();
        assert!(matches!(e, UploadError::Authentication(_)));

        let e: UploadError = SynoError::Vendor {
            code: 414,
            category: ErrorCategory::NameConflict,
            message: "exists".into(),
        }
        .into();
        assert!(matches!(e, UploadError::Vendor { code: 414, .. }));
    }
}
