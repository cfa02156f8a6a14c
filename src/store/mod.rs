//! Local album catalog: SQLite-backed persistence for albums and their
//! ordered image associations.

pub mod db;
pub mod error;
pub mod schema;
pub mod types;

pub use db::{AlbumStore, SqliteAlbumStore};
pub use error::StoreError;
pub use types::{
    AlbumCategory, AlbumFilter, AlbumImage, AlbumPatch, NewAlbum, NewAlbumImage,
};
