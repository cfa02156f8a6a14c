use crate::pipeline::CompressionSettings;
use crate::store::AlbumCategory;
use crate::syno::{PhotoSpace, SessionFamily};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CategoryArg {
    Fabric,
    Collection,
    Project,
    Season,
    Client,
    Event,
    Other,
}

impl From<CategoryArg> for AlbumCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Fabric => AlbumCategory::Fabric,
            CategoryArg::Collection => AlbumCategory::Collection,
            CategoryArg::Project => AlbumCategory::Project,
            CategoryArg::Season => AlbumCategory::Season,
            CategoryArg::Client => AlbumCategory::Client,
            CategoryArg::Event => AlbumCategory::Event,
            CategoryArg::Other => AlbumCategory::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SpaceArg {
    Personal,
    Shared,
}

impl From<SpaceArg> for PhotoSpace {
    fn from(arg: SpaceArg) -> Self {
        match arg {
            SpaceArg::Personal => PhotoSpace::Personal,
            SpaceArg::Shared => PhotoSpace::Shared,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FamilyArg {
    FileStation,
    PhotoStation,
    Foto,
}

impl From<FamilyArg> for SessionFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::FileStation => SessionFamily::FileStation,
            FamilyArg::PhotoStation => SessionFamily::PhotoStation,
            FamilyArg::Foto => SessionFamily::Foto,
        }
    }
}

/// Size bound profile for uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CompressionProfile {
    /// 2 MiB / 1920 px, for album galleries
    Gallery,
    /// 5 MiB / 2560 px, for bulk file-share uploads
    Bulk,
}

impl CompressionProfile {
    pub fn settings(&self) -> CompressionSettings {
        match self {
            CompressionProfile::Gallery => CompressionSettings::GALLERY,
            CompressionProfile::Bulk => CompressionSettings::BULK,
        }
    }
}
