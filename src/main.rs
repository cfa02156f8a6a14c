//! synoalbum — organize images on a Synology NAS into a local album catalog.
//!
//! Uploads go through the NAS WebAPI: candidate endpoints are probed in
//! order, sessions are established per API family (with the legacy
//! session-name quirks handled), files are size-bounded client-side, and
//! each successful upload is recorded in a SQLite album catalog with a
//! stable display order.

#![warn(clippy::all)]

mod cli;
mod config;
mod pipeline;
mod store;
mod syno;
mod types;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use cli::Command;
use config::NasConfig;
use pipeline::{FileJob, ProgressFn, UploadPipeline};
use store::{AlbumFilter, AlbumPatch, AlbumStore, NewAlbum, SqliteAlbumStore};
use syno::{Authenticator, Credentials, EndpointResolver, SessionFamily, UploadOrchestrator, UploadTarget};

/// Open (or create) the catalog database, creating its parent directory.
async fn open_store(args: &cli::DbArgs) -> anyhow::Result<SqliteAlbumStore> {
    let path = config::db_path(args);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    Ok(SqliteAlbumStore::open(&path).await?)
}

/// Resolve the password from args/env, falling back to an interactive prompt.
fn resolve_password(cfg: &NasConfig) -> anyhow::Result<String> {
    if let Some(password) = &cfg.password {
        return Ok(password.clone());
    }
    if !std::io::stdin().is_terminal() {
        anyhow::bail!("no password provided; set NAS_PASSWORD or pass --password");
    }
    Ok(rpassword::prompt_password(format!(
        "NAS password for {}: ",
        cfg.username
    ))?)
}

fn build_orchestrator(cfg: &NasConfig) -> anyhow::Result<UploadOrchestrator> {
    let password = resolve_password(cfg)?;
    let http = reqwest::Client::builder()
        .timeout(cfg.request_timeout)
        .build()?;
    let resolver = EndpointResolver::new(http.clone(), cfg.urls.clone(), cfg.probe_timeout);
    let auth = Authenticator::new(
        http.clone(),
        Credentials {
            account: cfg.username.clone(),
            password,
        },
    );
    Ok(UploadOrchestrator::new(
        http,
        resolver,
        auth,
        cfg.request_timeout,
    ))
}

async fn run_upload(args: cli::UploadArgs) -> anyhow::Result<()> {
    let cfg = NasConfig::from_args(&args.nas);
    tracing::debug!(?cfg, "resolved NAS configuration");

    let target = match (&args.path, args.folder_id) {
        (Some(path), _) => UploadTarget::LegacyPath(path.clone()),
        (None, Some(folder_id)) => UploadTarget::PhotosFolder {
            folder_id,
            space: args.space.into(),
        },
        (None, None) => anyhow::bail!("specify a destination: --folder-id or --path"),
    };

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("bad filename: {}", path.display()))?
            .to_string();
        files.push(FileJob { filename, bytes });
    }
    let total = files.len();

    let orchestrator = build_orchestrator(&cfg)?;
    let store = Arc::new(open_store(&args.db).await?);
    let pipeline = UploadPipeline::new(orchestrator, store, args.profile.settings());

    let bar = if args.no_progress_bar || !std::io::stderr().is_terminal() {
        None
    } else {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    };
    let progress: Option<Box<ProgressFn>> = bar.clone().map(|bar| {
        Box::new(move |done: usize, _total: usize| bar.set_position(done as u64))
            as Box<ProgressFn>
    });

    let report = pipeline
        .upload_batch(files, &target, &args.album, &args.added_by, progress.as_deref())
        .await?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    for uploaded in &report.succeeded {
        println!("uploaded {} -> {}", uploaded.filename, uploaded.image.image_url);
    }
    for failed in &report.failed {
        println!("FAILED   {}: {}", failed.filename, failed.error);
    }
    println!();
    println!(
        "{} uploaded, {} failed (of {})",
        report.succeeded.len(),
        report.failed.len(),
        total
    );

    if !report.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_login(args: cli::LoginArgs) -> anyhow::Result<()> {
    let cfg = NasConfig::from_args(&args.nas);
    let orchestrator = build_orchestrator(&cfg)?;

    let base = orchestrator.resolver().resolve().await?;
    println!("Connected to {base}");

    let families: Vec<SessionFamily> = if args.families.is_empty() {
        SessionFamily::ALL.to_vec()
    } else {
        args.families.iter().map(|&f| f.into()).collect()
    };
    let session = orchestrator.authenticator().establish(&base, &families).await?;

    for family in &families {
        if session.sid(*family).is_some() {
            println!("  {family}: session established");
        }
    }
    Ok(())
}

async fn run_create_album(args: cli::CreateAlbumArgs) -> anyhow::Result<()> {
    let store = open_store(&args.db).await?;
    let album = store
        .create_album(NewAlbum {
            name: args.name,
            description: args.description,
            category: args.category.into(),
            tags: args.tags,
            created_by: args.created_by,
        })
        .await?;
    println!("created album {} ({})", album.name, album.id);
    Ok(())
}

async fn run_albums(args: cli::ListAlbumsArgs) -> anyhow::Result<()> {
    let store = open_store(&args.db).await?;
    let filter = AlbumFilter {
        search: args.search,
        category: args.category.map(Into::into),
        tags: args.tags,
        created_by: args.created_by,
        created_after: args.created_after,
        created_before: args.created_before,
        include_inactive: args.include_inactive,
    };
    let albums = store.list_albums(&filter).await?;

    if albums.is_empty() {
        println!("No albums found.");
        return Ok(());
    }
    for album in albums {
        let marker = if album.is_active { "" } else { " [deleted]" };
        println!(
            "{}  {} [{}] ({} images){}",
            album.id,
            album.name,
            album.category.as_str(),
            album.image_count,
            marker
        );
    }
    Ok(())
}

async fn run_album(args: cli::AlbumArgs) -> anyhow::Result<()> {
    let store = open_store(&args.db).await?;
    let album = store
        .get_album(&args.album_id)
        .await?
        .with_context(|| format!("no such album: {}", args.album_id))?;

    println!("Album:    {} ({})", album.name, album.id);
    if let Some(description) = &album.description {
        println!("About:    {description}");
    }
    println!("Category: {}", album.category.as_str());
    if !album.tags.is_empty() {
        println!("Tags:     {}", album.tags.join(", "));
    }
    println!("Created:  {} by {}", album.created_at.format("%Y-%m-%d %H:%M:%S UTC"), album.created_by);
    if !album.is_active {
        println!("Status:   deleted");
    }

    let images = store.list_images(&album.id).await?;
    println!();
    println!("{} image(s):", images.len());
    for image in images {
        let cover = if album.cover_image_id == Some(image.id) {
            " (cover)"
        } else {
            ""
        };
        println!(
            "  #{:<3} [{}] {} -> {}{}",
            image.sort_order, image.id, image.image_name, image.image_url, cover
        );
    }
    Ok(())
}

async fn run_update_album(args: cli::UpdateAlbumArgs) -> anyhow::Result<()> {
    let store = open_store(&args.db).await?;
    let patch = AlbumPatch {
        name: args.name,
        description: if args.clear_description {
            Some(None)
        } else {
            args.description.map(Some)
        },
        category: args.category.map(Into::into),
        tags: if args.tags.is_empty() {
            None
        } else {
            Some(args.tags)
        },
    };
    if patch.is_empty() {
        anyhow::bail!("nothing to update; pass --name, --description, --category, or --tag");
    }
    let album = store.update_album(&args.album_id, patch).await?;
    println!("updated album {} ({})", album.name, album.id);
    Ok(())
}

async fn run_delete_album(args: cli::AlbumArgs) -> anyhow::Result<()> {
    let store = open_store(&args.db).await?;
    store.soft_delete_album(&args.album_id).await?;
    println!("album {} deleted (images stay recorded)", args.album_id);
    Ok(())
}

async fn run_remove_image(args: cli::ImageArgs) -> anyhow::Result<()> {
    let store = open_store(&args.db).await?;
    store.remove_image(&args.album_id, args.image_id).await?;
    println!("removed image {} from album {}", args.image_id, args.album_id);
    Ok(())
}

async fn run_reorder(args: cli::ReorderArgs) -> anyhow::Result<()> {
    let store = open_store(&args.db).await?;
    store.reorder_images(&args.album_id, &args.orders).await?;
    println!("reordered {} image(s)", args.orders.len());
    Ok(())
}

async fn run_set_cover(args: cli::ImageArgs) -> anyhow::Result<()> {
    let store = open_store(&args.db).await?;
    store.set_cover_image(&args.album_id, args.image_id).await?;
    println!("cover of album {} set to image {}", args.album_id, args.image_id);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let filter = match cli.log_level {
        types::LogLevel::Debug => "debug",
        types::LogLevel::Info => "info",
        types::LogLevel::Warn => "warn",
        types::LogLevel::Error => "error",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Upload(args) => run_upload(args).await,
        Command::Login(args) => run_login(args).await,
        Command::CreateAlbum(args) => run_create_album(args).await,
        Command::Albums(args) => run_albums(args).await,
        Command::Album(args) => run_album(args).await,
        Command::UpdateAlbum(args) => run_update_album(args).await,
        Command::DeleteAlbum(args) => run_delete_album(args).await,
        Command::RemoveImage(args) => run_remove_image(args).await,
        Command::Reorder(args) => run_reorder(args).await,
        Command::SetCover(args) => run_set_cover(args).await,
    }
}
