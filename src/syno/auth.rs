//! Session authentication against the NAS WebAPI.
//!
//! The box exposes several mutually incompatible authentication domains
//! ("session families"): generic file access, the legacy photo-station API
//! under `/photo/webapi`, and the newer personal/team photos API. Each family
//! hands out its own opaque sid, valid only for the base URL that produced
//! it. Sids are cached per (base URL, family) and re-established lazily; an
//! upload that fails with a session-class vendor code evicts the entry and
//! retries the login exactly once.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use super::error::SynoError;
use super::responses::{Envelope, LoginData};

/// One of the NAS's authentication domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionFamily {
    /// Generic file access (`SYNO.FileStation.*`).
    FileStation,
    /// Legacy photo API under `/photo/webapi`. Login for this family is
    /// quirky: the same credentials are accepted or rejected depending on the
    /// declared session name, so several names are tried in priority order.
    PhotoStation,
    /// The newer personal/team photos API (`SYNO.Foto.*` / `SYNO.FotoTeam.*`).
    Foto,
}

impl SessionFamily {
    pub const ALL: [SessionFamily; 3] = [
        SessionFamily::FileStation,
        SessionFamily::PhotoStation,
        SessionFamily::Foto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileStation => "file-station",
            Self::PhotoStation => "photo-station",
            Self::Foto => "foto",
        }
    }

    /// Login path relative to the base URL.
    fn login_path(&self) -> &'static str {
        match self {
            Self::FileStation | Self::Foto => "/webapi/auth.cgi",
            Self::PhotoStation => "/photo/webapi/auth.cgi",
        }
    }

    /// `session` form-field variants, in the priority order they are tried.
    fn session_names(&self) -> &'static [&'static str] {
        match self {
            Self::FileStation => &["FileStation"],
            Self::PhotoStation => &["PhotoStation", "FileStation", "Foto"],
            Self::Foto => &["Foto"],
        }
    }

    /// `SYNO.API.Auth` version the family's login endpoint expects.
    fn login_version(&self) -> &'static str {
        match self {
            Self::FileStation | Self::PhotoStation => "3",
            Self::Foto => "7",
        }
    }
}

impl std::fmt::Display for SessionFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub account: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An established session: the base URL it was minted against plus one sid
/// per family. Passed explicitly into upload calls instead of living as
/// hidden client state, so endpoint switches and re-auth are visible at the
/// call site.
#[derive(Debug, Clone)]
pub struct Session {
    pub base_url: String,
    sids: HashMap<SessionFamily, String>,
}

impl Session {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            sids: HashMap::new(),
        }
    }

    pub fn with_sid(mut self, family: SessionFamily, sid: impl Into<String>) -> Self {
        self.sids.insert(family, sid.into());
        self
    }

    pub fn sid(&self, family: SessionFamily) -> Option<&str> {
        self.sids.get(&family).map(String::as_str)
    }
}

/// Performs login handshakes and caches sids per (base URL, family).
pub struct Authenticator {
    http: reqwest::Client,
    credentials: Credentials,
    cache: Mutex<HashMap<(String, SessionFamily), String>>,
}

impl Authenticator {
    pub fn new(http: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            http,
            credentials,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Return a cached sid for (base, family), logging in on cache miss.
    pub async fn ensure(&self, base: &str, family: SessionFamily) -> Result<String, SynoError> {
        if let Some(sid) = self.cached(base, family) {
            return Ok(sid);
        }
        self.login(base, family).await
    }

    /// Drop a cached sid after an upload failed with a session-class code,
    /// so the next `ensure` performs a fresh handshake.
    pub fn evict(&self, base: &str, family: SessionFamily) {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&(base.to_string(), family));
    }

    /// Establish sids for every family against one base URL, returning an
    /// explicit [`Session`] value.
    pub async fn establish(
        &self,
        base: &str,
        families: &[SessionFamily],
    ) -> Result<Session, SynoError> {
        let mut session = Session::new(base);
        for &family in families {
            let sid = self.ensure(base, family).await?;
            session = session.with_sid(family, sid);
        }
        Ok(session)
    }

    /// Perform the login handshake, trying each of the family's session-name
    /// variants in priority order and accepting the first that succeeds.
    pub async fn login(&self, base: &str, family: SessionFamily) -> Result<String, SynoError> {
        let url = format!("{base}{}", family.login_path());
        let mut last_code: Option<i64> = None;

        for session_name in family.session_names() {
            let form = [
                ("api", "SYNO.API.Auth"),
                ("version", family.login_version()),
                ("method", "login"),
                ("account", self.credentials.account.as_str()),
                ("passwd", self.credentials.password.as_str()),
                ("session", session_name),
                ("format", "sid"),
            ];

            let response = self.http.post(&url).form(&form).send().await?;
            if !response.status().is_success() {
                return Err(SynoError::BadResponse(format!(
                    "login returned HTTP {}",
                    response.status()
                )));
            }

            let envelope: Envelope<LoginData> = response
                .json()
                .await
                .map_err(|e| SynoError::BadResponse(format!("login body: {e}")))?;

            if envelope.success {
                if let Some(data) = envelope.data {
                    info!(base = %base, family = %family, session_name, "login succeeded");
                    self.cache
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .insert((base.to_string(), family), data.sid.clone());
                    return Ok(data.sid);
                }
                return Err(SynoError::BadResponse(
                    "login succeeded but no sid in payload".into(),
                ));
            }

            let code = envelope.error_code();
            warn!(
                base = %base,
                family = %family,
                session_name,
                code,
                "login attempt rejected"
            );
            last_code = Some(code);
        }

        Err(SynoError::Auth {
            family,
            reason: match last_code {
                Some(code) => format!("all session-name variants rejected (last code {code})"),
                None => "no session-name variants configured".into(),
            },
        })
    }

    fn cached(&self, base: &str, family: SessionFamily) -> Option<String> {
        let sid = self
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&(base.to_string(), family))
            .cloned();
        if sid.is_some() {
            debug!(base = %base, family = %family, "sid cache hit");
        }
        sid
    }
}
