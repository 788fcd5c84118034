//! Upstream Catalog Provider Abstraction
//!
//! Provider-neutral views of tracks, artists and albums as returned by an
//! external music-metadata service, plus the trait each provider connector
//! implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// Kind of catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Track,
    Artist,
    Album,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Track => "track",
            EntityKind::Artist => "artist",
            EntityKind::Album => "album",
        }
    }

    /// Plural form, used in index keys and REST paths
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Track => "tracks",
            EntityKind::Artist => "artists",
            EntityKind::Album => "albums",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "track" | "tracks" => Ok(EntityKind::Track),
            "artist" | "artists" => Ok(EntityKind::Artist),
            "album" | "albums" => Ok(EntityKind::Album),
            other => Err(BridgeError::OperationFailed(format!(
                "Unknown entity kind: {}",
                other
            ))),
        }
    }
}

/// Lightweight reference to an artist credited on a track or album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

/// Lightweight reference to the album a track belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    pub album: Option<AlbumRef>,
    pub duration_ms: u64,
    pub track_number: Option<u32>,
    pub popularity: Option<u32>,
    pub preview_url: Option<String>,
    pub isrc: Option<String>,
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteArtist {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
    pub followers: Option<u64>,
    pub image_url: Option<String>,
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAlbum {
    pub id: String,
    pub name: String,
    /// `album`, `single` or `compilation`
    pub album_type: String,
    pub label: Option<String>,
    pub release_date: Option<String>,
    pub total_tracks: u32,
    pub artists: Vec<ArtistRef>,
    pub tracks: Vec<RemoteTrack>,
    pub image_url: Option<String>,
    pub external_url: Option<String>,
}

impl RemoteAlbum {
    pub fn is_compilation(&self) -> bool {
        self.album_type.eq_ignore_ascii_case("compilation")
    }

    /// Case-insensitive substring match of the album's label field
    pub fn label_matches(&self, label_name: &str) -> bool {
        let needle = label_name.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.label
            .as_deref()
            .map(|label| label.to_lowercase().contains(&needle))
            .unwrap_or(false)
    }
}

/// Any single catalog entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RemoteEntity {
    Track(RemoteTrack),
    Artist(RemoteArtist),
    Album(RemoteAlbum),
}

impl RemoteEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            RemoteEntity::Track(_) => EntityKind::Track,
            RemoteEntity::Artist(_) => EntityKind::Artist,
            RemoteEntity::Album(_) => EntityKind::Album,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RemoteEntity::Track(track) => &track.id,
            RemoteEntity::Artist(artist) => &artist.id,
            RemoteEntity::Album(album) => &album.id,
        }
    }
}

/// Upstream catalog provider trait
///
/// Connectors own authentication and rate-limit handling; callers only see
/// entities or a [`BridgeError::Upstream`] carrying the status and message.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::catalog::{CatalogProvider, EntityKind};
///
/// async fn show(provider: &dyn CatalogProvider) -> Result<()> {
///     let albums = provider.search_albums_by_label("Build It Tech").await?;
///     for album in albums {
///         println!("{} ({} tracks)", album.name, album.tracks.len());
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn get_track(&self, id: &str) -> Result<RemoteTrack>;

    async fn get_artist(&self, id: &str) -> Result<RemoteArtist>;

    /// Full album including its track listing
    async fn get_album(&self, id: &str) -> Result<RemoteAlbum>;

    /// Fetch any entity by kind
    async fn get_entity(&self, kind: EntityKind, id: &str) -> Result<RemoteEntity> {
        Ok(match kind {
            EntityKind::Track => RemoteEntity::Track(self.get_track(id).await?),
            EntityKind::Artist => RemoteEntity::Artist(self.get_artist(id).await?),
            EntityKind::Album => RemoteEntity::Album(self.get_album(id).await?),
        })
    }

    /// Full albums whose label field matches `label_name` (case-insensitive substring)
    async fn search_albums_by_label(&self, label_name: &str) -> Result<Vec<RemoteAlbum>>;

    /// Every track of a playlist, across all pages
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<RemoteTrack>>;
}
