//! Types for the album catalog store.

use chrono::{DateTime, Utc};

/// What an album collects. Stored as a short string column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlbumCategory {
    Fabric,
    Collection,
    Project,
    Season,
    Client,
    Event,
    #[default]
    Other,
}

impl AlbumCategory {
    /// Convert to the string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fabric => "fabric",
            Self::Collection => "collection",
            Self::Project => "project",
            Self::Season => "season",
            Self::Client => "client",
            Self::Event => "event",
            Self::Other => "other",
        }
    }

    /// Parse from the string stored in the database.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fabric" => Some(Self::Fabric),
            "collection" => Some(Self::Collection),
            "project" => Some(Self::Project),
            "season" => Some(Self::Season),
            "client" => Some(Self::Client),
            "event" => Some(Self::Event),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A named, ordered collection of images.
#[derive(Debug, Clone)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: AlbumCategory,
    /// Ordered tag list; persisted as a JSON text column.
    pub tags: Vec<String>,
    /// Row id of the designated cover image, if any.
    pub cover_image_id: Option<i64>,
    /// Denormalized display URL of the cover image.
    pub cover_image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    /// Derived from `album_images`, never stored.
    pub image_count: u32,
}

/// Caller input for creating an album.
#[derive(Debug, Clone)]
pub struct NewAlbum {
    pub name: String,
    pub description: Option<String>,
    pub category: AlbumCategory,
    pub tags: Vec<String>,
    pub created_by: String,
}

/// Partial field patch for an album. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct AlbumPatch {
    pub name: Option<String>,
    /// `Some(None)` clears the description; `None` keeps the current one.
    pub description: Option<Option<String>>,
    pub category: Option<AlbumCategory>,
    pub tags: Option<Vec<String>>,
}

impl AlbumPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }
}

/// Filter for listing albums. Defaults to active albums, newest first.
#[derive(Debug, Clone, Default)]
pub struct AlbumFilter {
    /// Case-insensitive substring over name and description.
    pub search: Option<String>,
    pub category: Option<AlbumCategory>,
    /// Albums must carry every requested tag.
    pub tags: Vec<String>,
    pub created_by: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub include_inactive: bool,
}

/// The association row linking one image to one album, carrying its display
/// order and upload provenance.
#[derive(Debug, Clone)]
pub struct AlbumImage {
    pub id: i64,
    pub album_id: String,
    /// Caller-supplied logical image reference (often the vendor file id).
    pub image_id: String,
    pub image_url: String,
    pub image_name: String,
    /// Display order, unique within an album, starting at 1.
    pub sort_order: i64,
    pub thumbnail_url: Option<String>,
    pub vendor_file_id: Option<String>,
    pub vendor_folder_id: Option<i64>,
    pub file_size: Option<u64>,
    pub compressed_size: Option<u64>,
    /// Percentage saved by compression, rounded to 2 decimals.
    pub compression_ratio: Option<f64>,
    pub added_at: DateTime<Utc>,
    pub added_by: String,
}

/// Caller input for adding an image association. `sort_order` is assigned by
/// the store, and `compression_ratio` is derived from the two sizes.
#[derive(Debug, Clone)]
pub struct NewAlbumImage {
    pub album_id: String,
    pub image_id: String,
    pub image_url: String,
    pub image_name: String,
    pub thumbnail_url: Option<String>,
    pub vendor_file_id: Option<String>,
    pub vendor_folder_id: Option<i64>,
    pub file_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub added_by: String,
}

/// `(original − compressed) / original` as a percentage rounded to 2
/// decimals; `None` when either size is absent or the original is zero.
pub fn compression_ratio(original: Option<u64>, compressed: Option<u64>) -> Option<f64> {
    let original = original?;
    let compressed = compressed?;
    if original == 0 {
        return None;
    }
    let ratio = (original.saturating_sub(compressed)) as f64 / original as f64 * 100.0;
    Some((ratio * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in [
            AlbumCategory::Fabric,
            AlbumCategory::Collection,
            AlbumCategory::Project,
            AlbumCategory::Season,
            AlbumCategory::Client,
            AlbumCategory::Event,
            AlbumCategory::Other,
        ] {
            assert_eq!(AlbumCategory::from_str(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_category_from_invalid() {
        assert_eq!(AlbumCategory::from_str("holiday"), None);
    }

    #[test]
    fn test_category_default_is_other() {
        assert_eq!(AlbumCategory::default(), AlbumCategory::Other);
    }

    #[test]
    fn test_compression_ratio_rounding() {
        // (3_000_000 - 1_000_000) / 3_000_000 = 66.666...%
        assert_eq!(
            compression_ratio(Some(3_000_000), Some(1_000_000)),
            Some(66.67)
        );
    }

    #[test]
    fn test_compression_ratio_missing_size() {
        assert_eq!(compression_ratio(None, Some(100)), None);
        assert_eq!(compression_ratio(Some(100), None), None);
    }

    #[test]
    fn test_compression_ratio_zero_original() {
        assert_eq!(compression_ratio(Some(0), Some(0)), None);
    }

    #[test]
    fn test_compression_ratio_no_shrink() {
        assert_eq!(compression_ratio(Some(500), Some(500)), Some(0.0));
    }

    #[test]
    fn test_empty_patch() {
        assert!(AlbumPatch::default().is_empty());
        let patch = AlbumPatch {
            name: Some("renamed".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
