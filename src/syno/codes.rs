//! Vendor error-code translation.
//!
//! The NAS WebAPI reports failures as bare numeric codes inside a
//! `{success: false, error: {code}}` envelope. Every code the system is known
//! to emit is mapped here, in one place, to a stable local category plus a
//! human-readable message. Codes outside the table fall through to
//! [`ErrorCategory::Unknown`] with the raw code preserved.

/// Stable local taxonomy for vendor failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    PermissionDenied,
    QuotaExceeded,
    PathInvalid,
    NameConflict,
    SessionExpired,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::QuotaExceeded => "quota_exceeded",
            Self::PathInvalid => "path_invalid",
            Self::NameConflict => "name_conflict",
            Self::SessionExpired => "session_expired",
            Self::Unknown => "unknown",
        }
    }
}

/// Documented vendor codes: WebAPI common codes (1xx) plus the FileStation
/// file-operation range (4xx/599).
const CODE_TABLE: &[(i64, ErrorCategory, &str)] = &[
    (100, ErrorCategory::Unknown, "unknown vendor error"),
    (101, ErrorCategory::Unknown, "invalid parameter"),
    (102, ErrorCategory::Unknown, "the requested API does not exist"),
    (103, ErrorCategory::Unknown, "the requested method does not exist"),
    (
        104,
        ErrorCategory::Unknown,
        "the requested version does not support this functionality",
    ),
    (
        105,
        ErrorCategory::PermissionDenied,
        "the logged-in session does not have permission",
    ),
    (106, ErrorCategory::SessionExpired, "session timeout"),
    (
        107,
        ErrorCategory::SessionExpired,
        "session interrupted by a duplicate login",
    ),
    (119, ErrorCategory::SessionExpired, "session id not found"),
    (
        400,
        ErrorCategory::Unknown,
        "invalid parameter of file operation",
    ),
    (401, ErrorCategory::Unknown, "unknown error of file operation"),
    (402, ErrorCategory::Unknown, "system is too busy"),
    (
        407,
        ErrorCategory::PermissionDenied,
        "file operation not permitted",
    ),
    (408, ErrorCategory::PathInvalid, "no such file or folder"),
    (409, ErrorCategory::PathInvalid, "unsupported file system"),
    (
        410,
        ErrorCategory::Unknown,
        "failed to connect internet-based file system",
    ),
    (
        411,
        ErrorCategory::PermissionDenied,
        "read-only file system",
    ),
    (
        412,
        ErrorCategory::PathInvalid,
        "file name too long in the non-encrypted file system",
    ),
    (
        413,
        ErrorCategory::PathInvalid,
        "file name too long in the encrypted file system",
    ),
    (414, ErrorCategory::NameConflict, "file already exists"),
    (415, ErrorCategory::QuotaExceeded, "disk quota exceeded"),
    (416, ErrorCategory::QuotaExceeded, "no space left on device"),
    (417, ErrorCategory::Unknown, "input/output error"),
    (418, ErrorCategory::PathInvalid, "illegal name or path"),
    (419, ErrorCategory::PathInvalid, "illegal file name"),
    (
        420,
        ErrorCategory::PathInvalid,
        "illegal file name on FAT file system",
    ),
    (421, ErrorCategory::Unknown, "device or resource busy"),
    (599, ErrorCategory::Unknown, "no such task of the file operation"),
];

/// Translate a vendor numeric code into (category, message).
///
/// Total and deterministic: every input maps to exactly one category, and an
/// undocumented code maps to [`ErrorCategory::Unknown`] with the raw code in
/// the message.
pub fn translate(code: i64) -> (ErrorCategory, String) {
    for &(known, category, message) in CODE_TABLE {
        if known == code {
            return (category, message.to_string());
        }
    }
    (
        ErrorCategory::Unknown,
        format!("unrecognized vendor error code {code}"),
    )
}
