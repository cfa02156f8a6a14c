use thiserror::Error;

use super::auth::SessionFamily;
use super::codes::ErrorCategory;

/// Errors raised by the NAS client layer (endpoint probing, login, upload).
#[derive(Debug, Error)]
pub enum SynoError {
    /// No candidate base URL answered the capability probe.
    #[error("no reachable NAS endpoint among {tried} candidate(s)")]
    Connectivity { tried: usize },

    /// Login handshake failed for a session family after all variants.
    #[error("authentication failed for the {family} session: {reason}")]
    Auth {
        family: SessionFamily,
        reason: String,
    },

    /// The NAS returned a structured `{success: false}` envelope.
    #[error("NAS error {code} ({}): {message}", category.as_str())]
    Vendor {
        code: i64,
        category: ErrorCategory,
        message: String,
    },

    /// Non-2xx status or a body that is not the expected envelope.
    /// Treated as connectivity-class by the upload failover logic.
    #[error("malformed NAS response: {0}")]
    BadResponse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl SynoError {
    /// Whether this failure warrants the one-shot endpoint failover retry.
    ///
    /// Vendor envelopes and auth rejections come from a NAS that is clearly
    /// reachable, so only transport-level failures qualify.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            SynoError::Connectivity { .. } | SynoError::BadResponse(_) | SynoError::Http(_)
        )
    }

    /// Whether the vendor code translates to an expired/invalid session.
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            SynoError::Vendor {
                category: ErrorCategory::SessionExpired,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_error_not_connectivity() {
        let e = SynoError::Vendor {
            code: 414,
            category: ErrorCategory::NameConflict,
            message: "file already exists".into(),
        };
        assert!(!e.is_connectivity());
        assert!(!e.is_session_expired());
    }

    #[test]
    fn test_session_expired_detection() {
        let e = SynoError::Vendor {
            code: 119,
            category: ErrorCategory::SessionExpired,
            message: "session id not found".into(),
        };
        assert!(e.is_session_expired());
        assert!(!e.is_connectivity());
    }

    #[test]
    fn test_bad_response_is_connectivity() {
        assert!(SynoError::BadResponse("truncated body".into()).is_connectivity());
    }

    #[test]
    fn test_auth_error_is_not_connectivity() {
        let e = SynoError::Auth {
            family: SessionFamily::FileStation,
            reason: "bad credentials".into(),
        };
        assert!(!e.is_connectivity());
    }
}
