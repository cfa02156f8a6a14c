//! Error types for the catalog store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during catalog database operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open or create the database file.
    #[error("Failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// Failed to run a database migration.
    #[error("Database migration failed: {0}")]
    Migration(#[from] rusqlite::Error),

    /// A statement failed.
    #[error("Database query failed: {0}")]
    Query(String),

    /// The referenced album does not exist (or is soft-deleted where an
    /// active album is required).
    #[error("No such album: {0}")]
    AlbumNotFound(String),

    /// The referenced image row does not exist within the given album.
    #[error("No image {image} in album {album_id}")]
    ImageNotFound { album_id: String, image: String },

    /// Malformed caller input (empty name, empty URL, bad order list).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failed to spawn a blocking task.
    #[error("Failed to spawn blocking task: {0}")]
    Spawn(#[from] tokio::task::JoinError),

    /// The database schema version is newer than supported.
    #[error("Database schema version {found} is newer than supported version {expected}")]
    UnsupportedSchemaVersion { found: i32, expected: i32 },
}

impl StoreError {
    /// Create a Query error from a rusqlite error.
    pub fn query(source: rusqlite::Error) -> Self {
        Self::Query(source.to_string())
    }
}
