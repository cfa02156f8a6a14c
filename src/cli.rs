use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::types::{CategoryArg, CompressionProfile, FamilyArg, LogLevel, SpaceArg};

#[derive(Parser, Debug)]
#[command(
    name = "synoalbum",
    about = "Upload images to a Synology NAS and organize them into albums"
)]
pub struct Cli {
    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

/// NAS connection arguments, shared by every command that talks to the NAS.
#[derive(Args, Debug, Clone)]
pub struct NasArgs {
    /// NAS base URL; repeat to give failover candidates, probed in order
    #[arg(short = 'U', long = "url", required = true)]
    pub urls: Vec<String>,

    /// NAS account name
    #[arg(short = 'u', long)]
    pub username: String,

    /// NAS password (if not provided, will prompt).
    /// WARNING: passing via --password is visible in process listings.
    /// Prefer the NAS_PASSWORD environment variable instead.
    #[arg(short = 'p', long, env = "NAS_PASSWORD")]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Endpoint probe timeout in seconds
    #[arg(long, default_value_t = 4)]
    pub probe_timeout_secs: u64,
}

/// Catalog database location.
#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// Path to the album catalog database
    #[arg(long, default_value = "~/.synoalbum/catalog.db")]
    pub db: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload files to the NAS and record them in an album
    Upload(UploadArgs),
    /// Verify connectivity and credentials by establishing sessions
    Login(LoginArgs),
    /// Create an album
    CreateAlbum(CreateAlbumArgs),
    /// List albums
    Albums(ListAlbumsArgs),
    /// Show one album and its images
    Album(AlbumArgs),
    /// Update album fields
    UpdateAlbum(UpdateAlbumArgs),
    /// Soft-delete an album (images stay recorded)
    DeleteAlbum(AlbumArgs),
    /// Remove an image from an album
    RemoveImage(ImageArgs),
    /// Reorder images within an album
    Reorder(ReorderArgs),
    /// Designate an album's cover image
    SetCover(ImageArgs),
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    #[command(flatten)]
    pub nas: NasArgs,

    #[command(flatten)]
    pub db: DbArgs,

    /// Album to record the uploads in
    #[arg(long)]
    pub album: String,

    /// Photos folder id to upload into (modern Photos API)
    #[arg(long, conflicts_with = "path")]
    pub folder_id: Option<i64>,

    /// Photo space for --folder-id
    #[arg(long, value_enum, default_value = "personal")]
    pub space: SpaceArg,

    /// Destination directory path (legacy File Station upload)
    #[arg(long)]
    pub path: Option<String>,

    /// Compression profile applied before upload
    #[arg(long, value_enum, default_value = "gallery")]
    pub profile: CompressionProfile,

    /// Name recorded as the uploader on each image
    #[arg(long, default_value = "cli")]
    pub added_by: String,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,

    /// Files to upload
    #[arg(required = true)]
    pub files: Vec<std::path::PathBuf>,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[command(flatten)]
    pub nas: NasArgs,

    /// Session families to establish (default: all)
    #[arg(long = "family", value_enum)]
    pub families: Vec<FamilyArg>,
}

#[derive(Args, Debug)]
pub struct CreateAlbumArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Album name
    pub name: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, value_enum, default_value = "other")]
    pub category: CategoryArg,

    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    #[arg(long, default_value = "cli")]
    pub created_by: String,
}

#[derive(Args, Debug)]
pub struct ListAlbumsArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Case-insensitive substring match on name and description
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,

    /// Required tag (repeatable; albums must carry all of them)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    #[arg(long)]
    pub created_by: Option<String>,

    /// Only albums created at or after this time (RFC 3339, or a date for midnight UTC)
    #[arg(long, value_parser = parse_utc_timestamp)]
    pub created_after: Option<DateTime<Utc>>,

    /// Only albums created at or before this time (RFC 3339, or a date for midnight UTC)
    #[arg(long, value_parser = parse_utc_timestamp)]
    pub created_before: Option<DateTime<Utc>>,

    /// Include soft-deleted albums
    #[arg(long)]
    pub include_inactive: bool,
}

#[derive(Args, Debug)]
pub struct AlbumArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Album id
    pub album_id: String,
}

#[derive(Args, Debug)]
pub struct UpdateAlbumArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Album id
    pub album_id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Drop the current description
    #[arg(long, conflicts_with = "description")]
    pub clear_description: bool,

    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,

    /// Replacement tag list (repeatable; omit to keep current tags)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ImageArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Album id
    pub album_id: String,

    /// Image row id (as printed by the `album` command)
    pub image_id: i64,
}

#[derive(Args, Debug)]
pub struct ReorderArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Album id
    pub album_id: String,

    /// IMAGE=ORDER pairs, e.g. 9042=1 9043=2
    #[arg(required = true, value_parser = parse_order_pair)]
    pub orders: Vec<(String, i64)>,
}

fn parse_order_pair(s: &str) -> Result<(String, i64), String> {
    let (image, order) = s
        .split_once('=')
        .ok_or_else(|| format!("expected IMAGE=ORDER, got '{s}'"))?;
    let order: i64 = order
        .parse()
        .map_err(|_| format!("'{order}' is not a valid order"))?;
    Ok((image.to_string(), order))
}

/// Accepts a full RFC 3339 timestamp or a bare date, read as midnight UTC.
fn parse_utc_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| format!("'{s}' is not an RFC 3339 timestamp or YYYY-MM-DD date"))
}
