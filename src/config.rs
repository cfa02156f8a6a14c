use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{DbArgs, NasArgs};

/// Resolved NAS connection settings.
pub struct NasConfig {
    pub urls: Vec<String>,
    pub username: String,
    pub password: Option<String>,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
}

impl std::fmt::Debug for NasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NasConfig")
            .field("urls", &self.urls)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}

impl NasConfig {
    pub fn from_args(args: &NasArgs) -> Self {
        Self {
            urls: args.urls.clone(),
            username: args.username.clone(),
            password: args.password.clone(),
            request_timeout: Duration::from_secs(args.timeout_secs),
            probe_timeout: Duration::from_secs(args.probe_timeout_secs),
        }
    }
}

/// Expand ~ to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Resolve the catalog database path from the CLI arguments.
pub fn db_path(args: &DbArgs) -> PathBuf {
    expand_tilde(&args.db)
}
