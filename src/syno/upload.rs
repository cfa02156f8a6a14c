//! Upload orchestration across the NAS's incompatible API generations.
//!
//! The FileStation generation addresses uploads by shared-folder path; the
//! newer Photos generation addresses them by numeric folder id and comes in
//! personal and team flavors with different API names. The target variant
//! decides the endpoint, the multipart field set, and the session family —
//! adding a third generation means adding a variant here, not a new
//! conditional at the call sites.

use std::time::Duration;

use reqwest::header::COOKIE;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, warn};

use super::auth::{Authenticator, Session, SessionFamily};
use super::codes::translate;
use super::endpoints::EndpointResolver;
use super::error::SynoError;
use super::responses::{Envelope, UploadData};

/// Extension → MIME table for upload content types. Unknown extensions fall
/// back to a generic binary type rather than failing the transfer.
const MIME_TABLE: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("svg", "image/svg+xml"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("m4v", "video/x-m4v"),
    ("avi", "video/x-msvideo"),
];

pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or_default();
    for &(known, mime) in MIME_TABLE {
        if known.eq_ignore_ascii_case(ext) {
            return mime;
        }
    }
    "application/octet-stream"
}

/// Whether the extension maps to a media type the catalog accepts.
pub fn is_supported_media(filename: &str) -> bool {
    content_type_for(filename) != "application/octet-stream"
}

/// Which space a Photos-generation folder lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSpace {
    Personal,
    Shared,
}

impl PhotoSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Shared => "shared",
        }
    }

    fn upload_api(&self) -> &'static str {
        match self {
            Self::Personal => "SYNO.Foto.Upload.Item",
            Self::Shared => "SYNO.FotoTeam.Upload.Item",
        }
    }
}

/// Where an upload lands, as a closed variant per API generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    /// FileStation generation: destination shared-folder path.
    LegacyPath(String),
    /// Photos generation: numeric folder id in a personal or team space.
    PhotosFolder { folder_id: i64, space: PhotoSpace },
}

impl UploadTarget {
    /// The session family whose sid authorizes this upload variant.
    pub fn family(&self) -> SessionFamily {
        match self {
            Self::LegacyPath(_) => SessionFamily::FileStation,
            Self::PhotosFolder { .. } => SessionFamily::Foto,
        }
    }

    fn upload_url(&self, base: &str) -> String {
        match self {
            Self::LegacyPath(_) => format!(
                "{base}/webapi/entry.cgi?api=SYNO.FileStation.Upload&method=upload&version=2"
            ),
            Self::PhotosFolder { space, .. } => format!(
                "{base}/photo/webapi/entry.cgi?api={}&method=upload_to_folder&version=1",
                space.upload_api()
            ),
        }
    }
}

/// Thumbnail sizes the Photos API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbSize {
    Sm,
    M,
    Xl,
}

impl ThumbSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sm => "sm",
            Self::M => "m",
            Self::Xl => "xl",
        }
    }
}

/// Synthesized Photos-API thumbnail URL for an uploaded item.
pub fn thumbnail_url(base: &str, item_id: i64, sid: &str, size: ThumbSize) -> String {
    format!(
        "{base}/photo/webapi/entry.cgi?api=SYNO.Foto.Thumbnail&method=get&version=1&id={item_id}&size={}&type=unit&_sid={sid}",
        size.as_str()
    )
}

/// Synthesized Photos-API download URL for an uploaded item.
pub fn download_url(base: &str, item_id: i64, sid: &str) -> String {
    format!(
        "{base}/photo/webapi/entry.cgi?api=SYNO.Foto.Download&method=download&version=1&item_id=[{item_id}]&_sid={sid}"
    )
}

/// FileStation download URL for a path-addressed file.
fn filestation_url(base: &str, path: &str, sid: &str) -> String {
    format!(
        "{base}/webapi/entry.cgi?api=SYNO.FileStation.Download&method=download&version=2&path={}&mode=open&_sid={sid}",
        urlencoding::encode(path)
    )
}

/// Normalized outcome of a successful upload, independent of which API
/// generation performed it.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub vendor_file_id: String,
    pub display_url: String,
    pub thumbnail_url: Option<String>,
    pub folder_id: Option<i64>,
}

pub struct UploadOrchestrator {
    http: reqwest::Client,
    resolver: EndpointResolver,
    auth: Authenticator,
    request_timeout: Duration,
}

impl UploadOrchestrator {
    pub fn new(
        http: reqwest::Client,
        resolver: EndpointResolver,
        auth: Authenticator,
        request_timeout: Duration,
    ) -> Self {
        Self {
            http,
            resolver,
            auth,
            request_timeout,
        }
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    /// Upload one file. Resolves an endpoint, ensures a session for the
    /// target's family, and sends the variant-specific multipart request.
    /// A connectivity-class failure retries the whole flow exactly once
    /// against the next candidate endpoint; a session-expired vendor code
    /// triggers exactly one re-login before surfacing.
    pub async fn upload(
        &self,
        bytes: &[u8],
        filename: &str,
        target: &UploadTarget,
    ) -> Result<UploadResult, SynoError> {
        let base = self.resolver.resolve().await?;
        match self.upload_via(&base, bytes, filename, target).await {
            Err(e) if e.is_connectivity() => {
                warn!(
                    base = %base,
                    error = %e,
                    "upload failed on resolved endpoint, failing over once"
                );
                let next = self.resolver.resolve_skipping(Some(&base)).await?;
                self.upload_via(&next, bytes, filename, target).await
            }
            other => other,
        }
    }

    async fn upload_via(
        &self,
        base: &str,
        bytes: &[u8],
        filename: &str,
        target: &UploadTarget,
    ) -> Result<UploadResult, SynoError> {
        let family = target.family();
        let sid = self.auth.ensure(base, family).await?;
        let session = Session::new(base).with_sid(family, sid);

        match self.send_upload(&session, bytes, filename, target).await {
            Err(e) if e.is_session_expired() => {
                info!(base = %base, family = %family, "session expired, re-authenticating once");
                self.auth.evict(base, family);
                let sid = self.auth.login(base, family).await?;
                let session = Session::new(base).with_sid(family, sid);
                self.send_upload(&session, bytes, filename, target).await
            }
            other => other,
        }
    }

    async fn send_upload(
        &self,
        session: &Session,
        bytes: &[u8],
        filename: &str,
        target: &UploadTarget,
    ) -> Result<UploadResult, SynoError> {
        let family = target.family();
        let sid = session.sid(family).ok_or_else(|| SynoError::Auth {
            family,
            reason: "session carries no sid for this family".into(),
        })?;

        let url = target.upload_url(&session.base_url);
        let form = build_form(bytes, filename, target)?;
        debug!(url = %url, file = filename, "sending multipart upload");

        let response = self
            .http
            .post(&url)
            .header(COOKIE, format!("id={sid}"))
            .multipart(form)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynoError::BadResponse(format!(
                "upload returned HTTP {status}"
            )));
        }

        let envelope: Envelope<UploadData> = response
            .json()
            .await
            .map_err(|e| SynoError::BadResponse(format!("upload body: {e}")))?;

        if !envelope.success {
            let code = envelope.error_code();
            let (category, message) = translate(code);
            return Err(SynoError::Vendor {
                code,
                category,
                message,
            });
        }

        let data = envelope.data.unwrap_or(UploadData {
            id: None,
            file: None,
            skipped: None,
        });

        match target {
            UploadTarget::PhotosFolder { folder_id, .. } => {
                let item_id = data.id.ok_or_else(|| {
                    SynoError::BadResponse("photos upload succeeded without an item id".into())
                })?;
                Ok(UploadResult {
                    vendor_file_id: item_id.to_string(),
                    display_url: download_url(&session.base_url, item_id, sid),
                    thumbnail_url: Some(thumbnail_url(
                        &session.base_url,
                        item_id,
                        sid,
                        ThumbSize::Sm,
                    )),
                    folder_id: Some(*folder_id),
                })
            }
            UploadTarget::LegacyPath(path) => {
                if data.skipped == Some(true) {
                    warn!(file = filename, "NAS skipped the upload as a duplicate");
                }
                let stored = data.file.as_deref().unwrap_or(filename);
                let full_path = format!("{}/{stored}", path.trim_end_matches('/'));
                Ok(UploadResult {
                    display_url: filestation_url(&session.base_url, &full_path, sid),
                    vendor_file_id: full_path,
                    thumbnail_url: None,
                    folder_id: None,
                })
            }
        }
    }
}

/// Build the multipart body for the target's API generation. The binary part
/// must come last; the NAS rejects sidecar fields that follow it.
fn build_form(bytes: &[u8], filename: &str, target: &UploadTarget) -> Result<Form, SynoError> {
    let mtime = chrono::Utc::now().timestamp_millis().to_string();
    let part = Part::bytes(bytes.to_vec())
        .file_name(filename.to_string())
        .mime_str(content_type_for(filename))
        .map_err(|e| SynoError::BadResponse(format!("content type: {e}")))?;

    let form = match target {
        UploadTarget::LegacyPath(path) => Form::new()
            .text("dest_folder_path", path.clone())
            .text("create_parents", "true")
            .text("overwrite", "true")
            .text("mtime", mtime),
        UploadTarget::PhotosFolder { folder_id, .. } => Form::new()
            .text("target_folder_id", folder_id.to_string())
            .text("duplicate", "ignore")
            .text("name", filename.to_string())
            .text("mtime", mtime),
    };
    Ok(form.part("file", part))
}
