//! Catalog store trait and SQLite implementation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use super::error::StoreError;
use super::schema;
use super::types::{
    compression_ratio, Album, AlbumCategory, AlbumFilter, AlbumImage, AlbumPatch, NewAlbum,
    NewAlbumImage,
};

/// Trait for catalog operations: albums and their ordered image associations.
///
/// Object-safe so the upload pipeline can hold an `Arc<dyn AlbumStore>`.
#[async_trait]
pub trait AlbumStore: Send + Sync {
    /// Create an album. Fails with `InvalidInput` when the name is blank.
    async fn create_album(&self, new: NewAlbum) -> Result<Album, StoreError>;

    /// Fetch one album by id, regardless of its active flag.
    async fn get_album(&self, id: &str) -> Result<Option<Album>, StoreError>;

    /// List albums matching the filter, newest first.
    async fn list_albums(&self, filter: &AlbumFilter) -> Result<Vec<Album>, StoreError>;

    /// Apply a partial field patch. Fields left `None` are unchanged.
    async fn update_album(&self, id: &str, patch: AlbumPatch) -> Result<Album, StoreError>;

    /// Flip `is_active` off. Child image rows are kept and stay queryable.
    async fn soft_delete_album(&self, id: &str) -> Result<(), StoreError>;

    /// Append an image association with the next sort order for the album
    /// (1 for an empty album). The order assignment and insert are one
    /// atomic statement, so concurrent adds cannot collide.
    async fn add_image(&self, new: NewAlbumImage) -> Result<AlbumImage, StoreError>;

    /// Hard-delete one association row, scoped to the album so a row from
    /// another album cannot be removed by id alone. Clears the parent's
    /// cover reference when it pointed at the removed row.
    async fn remove_image(&self, album_id: &str, image_row_id: i64) -> Result<(), StoreError>;

    /// Overwrite sort orders for the given (image_id, new_order) pairs in
    /// one atomic unit: any failure rolls the whole batch back. Partial
    /// lists are permitted; untouched rows keep their order, and resolving
    /// conflicts a partial list creates is the caller's responsibility.
    async fn reorder_images(
        &self,
        album_id: &str,
        pairs: &[(String, i64)],
    ) -> Result<(), StoreError>;

    /// Designate a cover image. The image must belong to the album.
    async fn set_cover_image(&self, album_id: &str, image_row_id: i64) -> Result<(), StoreError>;

    /// All image associations of an album in display order.
    async fn list_images(&self, album_id: &str) -> Result<Vec<AlbumImage>, StoreError>;

    /// Fetch one association row by id, scoped to the album.
    async fn get_image(
        &self,
        album_id: &str,
        image_row_id: i64,
    ) -> Result<Option<AlbumImage>, StoreError>;
}

/// SQLite implementation of the catalog store.
pub struct SqliteAlbumStore {
    /// Wrapped in Mutex because rusqlite::Connection is not Sync. Guards are
    /// never held across await points.
    conn: Mutex<Connection>,
    /// Path to the database file (for error messages).
    path: PathBuf,
}

impl std::fmt::Debug for SqliteAlbumStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteAlbumStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteAlbumStore {
    /// Open or create a database at the given path.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let path = path.to_path_buf();
        let path_clone = path.clone();

        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path_clone).map_err(|e| StoreError::Open {
                path: path_clone.clone(),
                source: e,
            })?;

            // WAL for better concurrent read/write behavior
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(StoreError::Migration)?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(StoreError::Migration)?;

            schema::migrate(&conn)?;

            Ok::<_, StoreError>(conn)
        })
        .await??;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source: e,
        })?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|e| StoreError::Query(e.to_string()))
    }
}

const ALBUM_COLUMNS: &str = "id, name, description, category, tags, cover_image_id, \
     cover_image_url, is_active, created_at, updated_at, created_by, \
     (SELECT COUNT(*) FROM album_images ai WHERE ai.album_id = albums.id)";

const IMAGE_COLUMNS: &str = "id, album_id, image_id, image_url, image_name, sort_order, \
     thumbnail_url, vendor_file_id, vendor_folder_id, file_size, compressed_size, \
     compression_ratio, added_at, added_by";

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}

fn row_to_album(row: &Row<'_>) -> rusqlite::Result<Album> {
    let category: String = row.get(3)?;
    let tags_json: String = row.get(4)?;
    Ok(Album {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: AlbumCategory::from_str(&category).unwrap_or_default(),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        cover_image_id: row.get(5)?,
        cover_image_url: row.get(6)?,
        is_active: row.get::<_, i64>(7)? != 0,
        created_at: ts(row.get(8)?),
        updated_at: ts(row.get(9)?),
        created_by: row.get(10)?,
        image_count: row.get::<_, i64>(11)? as u32,
    })
}

fn row_to_image(row: &Row<'_>) -> rusqlite::Result<AlbumImage> {
    Ok(AlbumImage {
        id: row.get(0)?,
        album_id: row.get(1)?,
        image_id: row.get(2)?,
        image_url: row.get(3)?,
        image_name: row.get(4)?,
        sort_order: row.get(5)?,
        thumbnail_url: row.get(6)?,
        vendor_file_id: row.get(7)?,
        vendor_folder_id: row.get(8)?,
        file_size: row.get::<_, Option<i64>>(9)?.map(|v| v as u64),
        compressed_size: row.get::<_, Option<i64>>(10)?.map(|v| v as u64),
        compression_ratio: row.get(11)?,
        added_at: ts(row.get(12)?),
        added_by: row.get(13)?,
    })
}

#[async_trait]
impl AlbumStore for SqliteAlbumStore {
    async fn create_album(&self, new: NewAlbum) -> Result<Album, StoreError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("album name must not be empty".into()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();
        let tags_json = serde_json::to_string(&new.tags)
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO albums (id, name, description, category, tags, is_active, created_at, updated_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6, ?7)",
            rusqlite::params![
                id,
                name,
                new.description,
                new.category.as_str(),
                tags_json,
                now,
                new.created_by,
            ],
        )
        .map_err(StoreError::query)?;

        tracing::debug!(album_id = %id, name, "album created");
        Ok(Album {
            id,
            name: name.to_string(),
            description: new.description,
            category: new.category,
            tags: new.tags,
            cover_image_id: None,
            cover_image_url: None,
            is_active: true,
            created_at: ts(now),
            updated_at: ts(now),
            created_by: new.created_by,
            image_count: 0,
        })
    }

    async fn get_album(&self, id: &str) -> Result<Option<Album>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = ?1"),
            [id],
            row_to_album,
        )
        .optional()
        .map_err(StoreError::query)
    }

    async fn list_albums(&self, filter: &AlbumFilter) -> Result<Vec<Album>, StoreError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if !filter.include_inactive {
            clauses.push("is_active = 1".into());
        }
        if let Some(search) = &filter.search {
            let needle = format!("%{}%", search.to_lowercase());
            clauses.push(
                "(LOWER(name) LIKE ? OR LOWER(COALESCE(description, '')) LIKE ?)".into(),
            );
            params.push(Box::new(needle.clone()));
            params.push(Box::new(needle));
        }
        if let Some(category) = filter.category {
            clauses.push("category = ?".into());
            params.push(Box::new(category.as_str().to_string()));
        }
        if let Some(creator) = &filter.created_by {
            clauses.push("created_by = ?".into());
            params.push(Box::new(creator.clone()));
        }
        if let Some(after) = filter.created_after {
            clauses.push("created_at >= ?".into());
            params.push(Box::new(after.timestamp()));
        }
        if let Some(before) = filter.created_before {
            clauses.push("created_at <= ?".into());
            params.push(Box::new(before.timestamp()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {ALBUM_COLUMNS} FROM albums {where_clause} ORDER BY created_at DESC, rowid DESC"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(StoreError::query)?;
        let albums = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), row_to_album)
            .map_err(StoreError::query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query)?;

        // Tag intersection is applied over the decoded JSON column: an album
        // qualifies only when it carries every requested tag.
        if filter.tags.is_empty() {
            Ok(albums)
        } else {
            Ok(albums
                .into_iter()
                .filter(|a| filter.tags.iter().all(|t| a.tags.contains(t)))
                .collect())
        }
    }

    async fn update_album(&self, id: &str, patch: AlbumPatch) -> Result<Album, StoreError> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(StoreError::InvalidInput("album name must not be empty".into()));
            }
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StoreError::query)?;

        let current = tx
            .query_row(
                &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = ?1"),
                [id],
                row_to_album,
            )
            .optional()
            .map_err(StoreError::query)?
            .ok_or_else(|| StoreError::AlbumNotFound(id.to_string()))?;

        let name = patch.name.unwrap_or_else(|| current.name.clone());
        let description = patch
            .description
            .unwrap_or_else(|| current.description.clone());
        let category = patch.category.unwrap_or(current.category);
        let tags = patch.tags.unwrap_or_else(|| current.tags.clone());
        let tags_json =
            serde_json::to_string(&tags).map_err(|e| StoreError::Query(e.to_string()))?;
        let now = Utc::now().timestamp();

        tx.execute(
            "UPDATE albums SET name = ?1, description = ?2, category = ?3, tags = ?4, updated_at = ?5 WHERE id = ?6",
            rusqlite::params![name.trim(), description, category.as_str(), tags_json, now, id],
        )
        .map_err(StoreError::query)?;

        tx.commit().map_err(StoreError::query)?;

        Ok(Album {
            name: name.trim().to_string(),
            description,
            category,
            tags,
            updated_at: ts(now),
            ..current
        })
    }

    async fn soft_delete_album(&self, id: &str) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        let conn = self.lock()?;
        let affected = conn
            .execute(
                "UPDATE albums SET is_active = 0, updated_at = ?1 WHERE id = ?2",
                rusqlite::params![now, id],
            )
            .map_err(StoreError::query)?;
        if affected == 0 {
            return Err(StoreError::AlbumNotFound(id.to_string()));
        }
        tracing::info!(album_id = %id, "album soft-deleted");
        Ok(())
    }

    async fn add_image(&self, new: NewAlbumImage) -> Result<AlbumImage, StoreError> {
        if new.image_url.trim().is_empty() {
            return Err(StoreError::InvalidInput("image URL must not be empty".into()));
        }
        if new.image_id.trim().is_empty() {
            return Err(StoreError::InvalidInput("image id must not be empty".into()));
        }

        let ratio = compression_ratio(new.file_size, new.compressed_size);
        let now = Utc::now().timestamp();

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StoreError::query)?;

        let active: Option<i64> = tx
            .query_row(
                "SELECT is_active FROM albums WHERE id = ?1",
                [new.album_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::query)?;
        match active {
            Some(1) => {}
            // A soft-deleted album is invisible to writers.
            Some(_) | None => return Err(StoreError::AlbumNotFound(new.album_id)),
        }

        // Order assignment and insert in a single statement: the aggregate
        // subselect always yields exactly one row, so two concurrent adds
        // cannot read the same max.
        tx.execute(
            "INSERT INTO album_images (album_id, image_id, image_url, image_name, sort_order,
                 thumbnail_url, vendor_file_id, vendor_folder_id, file_size, compressed_size,
                 compression_ratio, added_at, added_by)
             SELECT ?1, ?2, ?3, ?4, COALESCE(MAX(sort_order), 0) + 1, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12
             FROM album_images WHERE album_id = ?1",
            rusqlite::params![
                new.album_id,
                new.image_id,
                new.image_url,
                new.image_name,
                new.thumbnail_url,
                new.vendor_file_id,
                new.vendor_folder_id,
                new.file_size.map(|v| v as i64),
                new.compressed_size.map(|v| v as i64),
                ratio,
                now,
                new.added_by,
            ],
        )
        .map_err(StoreError::query)?;

        let row_id = tx.last_insert_rowid();
        let image = tx
            .query_row(
                &format!("SELECT {IMAGE_COLUMNS} FROM album_images WHERE id = ?1"),
                [row_id],
                row_to_image,
            )
            .map_err(StoreError::query)?;

        tx.commit().map_err(StoreError::query)?;
        tracing::debug!(
            album_id = %image.album_id,
            image_row = image.id,
            sort_order = image.sort_order,
            "image association added"
        );
        Ok(image)
    }

    async fn remove_image(&self, album_id: &str, image_row_id: i64) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StoreError::query)?;

        let affected = tx
            .execute(
                "DELETE FROM album_images WHERE id = ?1 AND album_id = ?2",
                rusqlite::params![image_row_id, album_id],
            )
            .map_err(StoreError::query)?;
        if affected == 0 {
            return Err(StoreError::ImageNotFound {
                album_id: album_id.to_string(),
                image: image_row_id.to_string(),
            });
        }

        // Reconcile a dangling cover reference in the same transaction.
        tx.execute(
            "UPDATE albums SET cover_image_id = NULL, cover_image_url = NULL, updated_at = ?1
             WHERE id = ?2 AND cover_image_id = ?3",
            rusqlite::params![now, album_id, image_row_id],
        )
        .map_err(StoreError::query)?;

        tx.commit().map_err(StoreError::query)?;
        Ok(())
    }

    async fn reorder_images(
        &self,
        album_id: &str,
        pairs: &[(String, i64)],
    ) -> Result<(), StoreError> {
        if pairs.is_empty() {
            return Err(StoreError::InvalidInput("empty reorder list".into()));
        }
        if pairs.iter().any(|&(_, order)| order < 1) {
            return Err(StoreError::InvalidInput("sort orders start at 1".into()));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StoreError::query)?;

        for (image_id, new_order) in pairs {
            let affected = tx
                .execute(
                    "UPDATE album_images SET sort_order = ?1 WHERE album_id = ?2 AND image_id = ?3",
                    rusqlite::params![new_order, album_id, image_id],
                )
                .map_err(StoreError::query)?;
            if affected == 0 {
                // Dropping the uncommitted transaction rolls everything back.
                return Err(StoreError::ImageNotFound {
                    album_id: album_id.to_string(),
                    image: image_id.clone(),
                });
            }
        }

        tx.commit().map_err(StoreError::query)?;
        tracing::debug!(album_id = %album_id, updates = pairs.len(), "images reordered");
        Ok(())
    }

    async fn set_cover_image(&self, album_id: &str, image_row_id: i64) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StoreError::query)?;

        // Membership check: the cover must reference an image of this album.
        let image_url: Option<String> = tx
            .query_row(
                "SELECT image_url FROM album_images WHERE id = ?1 AND album_id = ?2",
                rusqlite::params![image_row_id, album_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::query)?;
        let image_url = image_url.ok_or_else(|| StoreError::ImageNotFound {
            album_id: album_id.to_string(),
            image: image_row_id.to_string(),
        })?;

        let affected = tx
            .execute(
                "UPDATE albums SET cover_image_id = ?1, cover_image_url = ?2, updated_at = ?3 WHERE id = ?4",
                rusqlite::params![image_row_id, image_url, now, album_id],
            )
            .map_err(StoreError::query)?;
        if affected == 0 {
            return Err(StoreError::AlbumNotFound(album_id.to_string()));
        }

        tx.commit().map_err(StoreError::query)?;
        Ok(())
    }

    async fn list_images(&self, album_id: &str) -> Result<Vec<AlbumImage>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {IMAGE_COLUMNS} FROM album_images WHERE album_id = ?1 ORDER BY sort_order ASC, id ASC"
            ))
            .map_err(StoreError::query)?;
        let rows = stmt
            .query_map([album_id], row_to_image)
            .map_err(StoreError::query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query)?;
        Ok(rows)
    }

    async fn get_image(
        &self,
        album_id: &str,
        image_row_id: i64,
    ) -> Result<Option<AlbumImage>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!(
                "SELECT {IMAGE_COLUMNS} FROM album_images WHERE id = ?1 AND album_id = ?2"
            ),
            rusqlite::params![image_row_id, album_id],
            row_to_image,
        )
        .optional()
        .map_err(StoreError::query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_album(name: &str) -> NewAlbum {
        NewAlbum {
            name: name.to_string(),
            description: None,
            category: AlbumCategory::Other,
            tags: Vec::new(),
            created_by: "tester".into(),
        }
    }

    fn new_image(album_id: &str, image_id: &str) -> NewAlbumImage {
        NewAlbumImage {
            album_id: album_id.to_string(),
            image_id: image_id.to_string(),
            image_url: format!("http://nas/dl/{image_id}"),
            image_name: format!("{image_id}.jpg"),
            thumbnail_url: None,
            vendor_file_id: Some(image_id.to_string()),
            vendor_folder_id: Some(4),
            file_size: None,
            compressed_size: None,
            added_by: "tester".into(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let created = store
            .create_album(NewAlbum {
                name: "Indigo fabrics".into(),
                description: Some("shibori samples".into()),
                category: AlbumCategory::Fabric,
                tags: vec!["indigo".into(), "2026".into()],
                created_by: "weaver".into(),
            })
            .await
            .unwrap();

        let fetched = store.get_album(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Indigo fabrics");
        assert_eq!(fetched.category, AlbumCategory::Fabric);
        assert_eq!(fetched.tags, vec!["indigo", "2026"]);
        assert!(fetched.is_active);
        assert_eq!(fetched.image_count, 0);
        assert_eq!(fetched.created_by, "weaver");
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let err = store.create_album(new_album("   ")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let a = store.create_album(new_album("first")).await.unwrap();
        let b = store.create_album(new_album("second")).await.unwrap();
        let c = store.create_album(new_album("third")).await.unwrap();

        let listed = store.list_albums(&AlbumFilter::default()).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![c.id.as_str(), b.id.as_str(), a.id.as_str()]);
    }

    #[tokio::test]
    async fn test_list_search_is_case_insensitive() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        store
            .create_album(NewAlbum {
                description: Some("Spring COLLECTION shots".into()),
                ..new_album("Lookbook")
            })
            .await
            .unwrap();
        store.create_album(new_album("Unrelated")).await.unwrap();

        let filter = AlbumFilter {
            search: Some("collection".into()),
            ..Default::default()
        };
        let hits = store.list_albums(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Lookbook");
    }

    #[tokio::test]
    async fn test_list_tag_intersection() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        store
            .create_album(NewAlbum {
                tags: vec!["wool".into(), "winter".into()],
                ..new_album("both tags")
            })
            .await
            .unwrap();
        store
            .create_album(NewAlbum {
                tags: vec!["wool".into()],
                ..new_album("one tag")
            })
            .await
            .unwrap();

        let filter = AlbumFilter {
            tags: vec!["wool".into(), "winter".into()],
            ..Default::default()
        };
        let hits = store.list_albums(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "both tags");
    }

    #[tokio::test]
    async fn test_list_filters_category_and_creator() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        store
            .create_album(NewAlbum {
                category: AlbumCategory::Event,
                created_by: "ann".into(),
                ..new_album("open day")
            })
            .await
            .unwrap();
        store
            .create_album(NewAlbum {
                category: AlbumCategory::Project,
                created_by: "ann".into(),
                ..new_album("tapestry")
            })
            .await
            .unwrap();

        let filter = AlbumFilter {
            category: Some(AlbumCategory::Event),
            created_by: Some("ann".into()),
            ..Default::default()
        };
        let hits = store.list_albums(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "open day");
    }

    #[tokio::test]
    async fn test_list_filters_creation_date_range() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let early = store.create_album(new_album("january")).await.unwrap();
        let mid = store.create_album(new_album("march")).await.unwrap();
        let late = store.create_album(new_album("june")).await.unwrap();

        // Backdate the rows so the bounds land between known timestamps.
        {
            let conn = store.lock().unwrap();
            for (id, at) in [(&early.id, 1_000_i64), (&mid.id, 2_000), (&late.id, 3_000)] {
                conn.execute(
                    "UPDATE albums SET created_at = ?1 WHERE id = ?2",
                    rusqlite::params![at, id],
                )
                .unwrap();
            }
        }

        let filter = AlbumFilter {
            created_after: Some(ts(1_500)),
            created_before: Some(ts(2_500)),
            ..Default::default()
        };
        let hits = store.list_albums(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "march");

        // Both bounds are inclusive.
        let exact = AlbumFilter {
            created_after: Some(ts(2_000)),
            created_before: Some(ts(2_000)),
            ..Default::default()
        };
        let hits = store.list_albums(&exact).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "march");

        let open_after = AlbumFilter {
            created_after: Some(ts(1_500)),
            ..Default::default()
        };
        assert_eq!(store.list_albums(&open_after).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_partial_patch() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album = store
            .create_album(NewAlbum {
                description: Some("keep me".into()),
                ..new_album("old name")
            })
            .await
            .unwrap();

        let updated = store
            .update_album(
                &album.id,
                AlbumPatch {
                    name: Some("new name".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "new name");
        assert_eq!(updated.description.as_deref(), Some("keep me"));
    }

    #[tokio::test]
    async fn test_update_description_replace_and_clear() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album = store
            .create_album(NewAlbum {
                description: Some("first draft".into()),
                ..new_album("notes")
            })
            .await
            .unwrap();

        let updated = store
            .update_album(
                &album.id,
                AlbumPatch {
                    description: Some(Some("final copy".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("final copy"));

        let cleared = store
            .update_album(
                &album.id,
                AlbumPatch {
                    description: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.description, None);

        let fetched = store.get_album(&album.id).await.unwrap().unwrap();
        assert_eq!(fetched.description, None);
    }

    #[tokio::test]
    async fn test_update_missing_album() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let err = store
            .update_album("nope", AlbumPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlbumNotFound(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_album_but_keeps_images() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album = store.create_album(new_album("retired")).await.unwrap();
        let image = store.add_image(new_image(&album.id, "img-1")).await.unwrap();

        store.soft_delete_album(&album.id).await.unwrap();

        // Excluded from the active view...
        assert!(store
            .list_albums(&AlbumFilter::default())
            .await
            .unwrap()
            .is_empty());
        // ...but still visible when asked for, with images intact.
        let filter = AlbumFilter {
            include_inactive: true,
            ..Default::default()
        };
        assert_eq!(store.list_albums(&filter).await.unwrap().len(), 1);
        assert!(store
            .get_image(&album.id, image.id)
            .await
            .unwrap()
            .is_some());
        assert_eq!(store.list_images(&album.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_image_assigns_sequential_sort_order() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album = store.create_album(new_album("ordered")).await.unwrap();

        let a = store.add_image(new_image(&album.id, "a")).await.unwrap();
        let b = store.add_image(new_image(&album.id, "b")).await.unwrap();
        let c = store.add_image(new_image(&album.id, "c")).await.unwrap();
        assert_eq!((a.sort_order, b.sort_order, c.sort_order), (1, 2, 3));

        let album = store.get_album(&album.id).await.unwrap().unwrap();
        assert_eq!(album.image_count, 3);
    }

    #[tokio::test]
    async fn test_add_image_to_missing_or_inactive_album() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let err = store.add_image(new_image("ghost", "a")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlbumNotFound(_)));

        let album = store.create_album(new_album("retired")).await.unwrap();
        store.soft_delete_album(&album.id).await.unwrap();
        let err = store.add_image(new_image(&album.id, "a")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlbumNotFound(_)));
    }

    #[tokio::test]
    async fn test_add_image_persists_provenance() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album = store.create_album(new_album("prov")).await.unwrap();

        let image = store
            .add_image(NewAlbumImage {
                thumbnail_url: Some("http://nas/thumb/1".into()),
                file_size: Some(3_000_000),
                compressed_size: Some(1_000_000),
                ..new_image(&album.id, "img-1")
            })
            .await
            .unwrap();

        assert_eq!(image.file_size, Some(3_000_000));
        assert_eq!(image.compressed_size, Some(1_000_000));
        assert_eq!(image.compression_ratio, Some(66.67));
        assert_eq!(image.thumbnail_url.as_deref(), Some("http://nas/thumb/1"));
    }

    #[tokio::test]
    async fn test_remove_image_scoped_to_album() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album1 = store.create_album(new_album("one")).await.unwrap();
        let album2 = store.create_album(new_album("two")).await.unwrap();
        let image = store.add_image(new_image(&album1.id, "a")).await.unwrap();

        // Wrong album id must not delete the row.
        let err = store.remove_image(&album2.id, image.id).await.unwrap_err();
        assert!(matches!(err, StoreError::ImageNotFound { .. }));
        assert!(store
            .get_image(&album1.id, image.id)
            .await
            .unwrap()
            .is_some());

        store.remove_image(&album1.id, image.id).await.unwrap();
        assert!(store
            .get_image(&album1.id, image.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_remove_cover_image_clears_album_cover() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album = store.create_album(new_album("covered")).await.unwrap();
        let image = store.add_image(new_image(&album.id, "a")).await.unwrap();
        store.set_cover_image(&album.id, image.id).await.unwrap();

        let with_cover = store.get_album(&album.id).await.unwrap().unwrap();
        assert_eq!(with_cover.cover_image_id, Some(image.id));
        assert!(with_cover.cover_image_url.is_some());

        store.remove_image(&album.id, image.id).await.unwrap();
        let cleared = store.get_album(&album.id).await.unwrap().unwrap();
        assert_eq!(cleared.cover_image_id, None);
        assert_eq!(cleared.cover_image_url, None);
    }

    #[tokio::test]
    async fn test_set_cover_requires_membership() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album1 = store.create_album(new_album("one")).await.unwrap();
        let album2 = store.create_album(new_album("two")).await.unwrap();
        let foreign = store.add_image(new_image(&album2.id, "x")).await.unwrap();

        let err = store
            .set_cover_image(&album1.id, foreign.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ImageNotFound { .. }));
        let album = store.get_album(&album1.id).await.unwrap().unwrap();
        assert_eq!(album.cover_image_id, None);
    }

    #[tokio::test]
    async fn test_reorder_applies_all_pairs() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album = store.create_album(new_album("shuffle")).await.unwrap();
        store.add_image(new_image(&album.id, "a")).await.unwrap();
        store.add_image(new_image(&album.id, "b")).await.unwrap();
        store.add_image(new_image(&album.id, "c")).await.unwrap();

        store
            .reorder_images(
                &album.id,
                &[("a".into(), 3), ("b".into(), 1), ("c".into(), 2)],
            )
            .await
            .unwrap();

        let images = store.list_images(&album.id).await.unwrap();
        let ids: Vec<&str> = images.iter().map(|i| i.image_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_reorder_is_atomic_on_failure() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album = store.create_album(new_album("atomic")).await.unwrap();
        store.add_image(new_image(&album.id, "a")).await.unwrap();
        store.add_image(new_image(&album.id, "b")).await.unwrap();

        // Second pair references a missing image: the whole batch must roll back.
        let err = store
            .reorder_images(&album.id, &[("a".into(), 2), ("ghost".into(), 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ImageNotFound { .. }));

        let images = store.list_images(&album.id).await.unwrap();
        let orders: Vec<(String, i64)> = images
            .iter()
            .map(|i| (i.image_id.clone(), i.sort_order))
            .collect();
        assert_eq!(orders, vec![("a".into(), 1), ("b".into(), 2)]);
    }

    #[tokio::test]
    async fn test_reorder_partial_list_leaves_rest_untouched() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album = store.create_album(new_album("partial")).await.unwrap();
        store.add_image(new_image(&album.id, "a")).await.unwrap();
        store.add_image(new_image(&album.id, "b")).await.unwrap();
        store.add_image(new_image(&album.id, "c")).await.unwrap();

        store
            .reorder_images(&album.id, &[("c".into(), 5)])
            .await
            .unwrap();

        let images = store.list_images(&album.id).await.unwrap();
        let orders: Vec<(String, i64)> = images
            .iter()
            .map(|i| (i.image_id.clone(), i.sort_order))
            .collect();
        assert_eq!(
            orders,
            vec![("a".into(), 1), ("b".into(), 2), ("c".into(), 5)]
        );
    }

    #[tokio::test]
    async fn test_reorder_rejects_bad_input() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let album = store.create_album(new_album("bad")).await.unwrap();
        assert!(matches!(
            store.reorder_images(&album.id, &[]).await.unwrap_err(),
            StoreError::InvalidInput(_)
        ));
        assert!(matches!(
            store
                .reorder_images(&album.id, &[("a".into(), 0)])
                .await
                .unwrap_err(),
            StoreError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let store = SqliteAlbumStore::open(&path).await.unwrap();
        let album = store.create_album(new_album("persisted")).await.unwrap();
        drop(store);

        let reopened = SqliteAlbumStore::open(&path).await.unwrap();
        assert!(reopened.get_album(&album.id).await.unwrap().is_some());
    }
}
