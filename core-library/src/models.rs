//! Domain models for the label catalog
//!
//! Row types map 1:1 onto the tables in `migrations/`; roles and release
//! types are stored as text and exposed through typed enums.

use bridge_traits::catalog::{ArtistRef, RemoteAlbum, RemoteTrack};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::LibraryError;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

// =============================================================================
// Enumerations
// =============================================================================

/// Role an artist holds on a release or track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtistRole {
    Primary,
    Remixer,
    Featured,
}

impl ArtistRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtistRole::Primary => "primary",
            ArtistRole::Remixer => "remixer",
            ArtistRole::Featured => "featured",
        }
    }

    /// Interpret a stored role; `NULL` means primary
    pub fn from_column(value: Option<&str>) -> Result<Self, LibraryError> {
        match value {
            None => Ok(ArtistRole::Primary),
            Some(raw) => raw.parse(),
        }
    }
}

impl fmt::Display for ArtistRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtistRole {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(ArtistRole::Primary),
            "remixer" => Ok(ArtistRole::Remixer),
            "featured" => Ok(ArtistRole::Featured),
            other => Err(LibraryError::InvalidInput {
                field: "role".to_string(),
                message: format!("unknown artist role '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Album,
    Single,
    Ep,
    Compilation,
}

impl ReleaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Album => "album",
            ReleaseType::Single => "single",
            ReleaseType::Ep => "ep",
            ReleaseType::Compilation => "compilation",
        }
    }

    /// Map an upstream `album_type`; anything unrecognised is an album
    pub fn from_upstream(album_type: &str) -> Self {
        album_type.parse().unwrap_or(ReleaseType::Album)
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseType {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "album" => Ok(ReleaseType::Album),
            "single" => Ok(ReleaseType::Single),
            "ep" => Ok(ReleaseType::Ep),
            "compilation" => Ok(ReleaseType::Compilation),
            other => Err(LibraryError::InvalidInput {
                field: "release_type".to_string(),
                message: format!("unknown release type '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Domain Models
// =============================================================================

/// Record label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Label {
    /// Canonical label id
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

impl Label {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Artist {
    pub id: String,
    /// Upstream identifier; the find-or-create key on import
    pub spotify_id: Option<String>,
    pub name: String,
    /// Direct label assignment
    pub label_id: Option<String>,
    pub image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Artist {
    pub fn new(name: impl Into<String>) -> Self {
        let ts = now();
        Self {
            id: Uuid::new_v4().to_string(),
            spotify_id: None,
            name: name.into(),
            label_id: None,
            image_url: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn with_spotify_id(mut self, spotify_id: impl Into<String>) -> Self {
        self.spotify_id = Some(spotify_id.into());
        self
    }

    pub fn with_label(mut self, label_id: impl Into<String>) -> Self {
        self.label_id = Some(label_id.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Artist name cannot be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Release {
    pub id: String,
    pub spotify_id: Option<String>,
    pub title: String,
    /// One of `album`, `single`, `ep`, `compilation`
    pub release_type: String,
    /// ISO-8601 date, possibly year or year-month precision
    pub release_date: Option<String>,
    pub label_id: Option<String>,
    pub artwork_url: Option<String>,
    pub total_tracks: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Release {
    pub fn new(title: impl Into<String>, release_type: ReleaseType) -> Self {
        let ts = now();
        Self {
            id: Uuid::new_v4().to_string(),
            spotify_id: None,
            title: title.into(),
            release_type: release_type.as_str().to_string(),
            release_date: None,
            label_id: None,
            artwork_url: None,
            total_tracks: 0,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn with_spotify_id(mut self, spotify_id: impl Into<String>) -> Self {
        self.spotify_id = Some(spotify_id.into());
        self
    }

    pub fn with_label(mut self, label_id: impl Into<String>) -> Self {
        self.label_id = Some(label_id.into());
        self
    }

    pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
        self.release_date = Some(date.into());
        self
    }

    pub fn kind(&self) -> ReleaseType {
        ReleaseType::from_upstream(&self.release_type)
    }

    pub fn is_compilation(&self) -> bool {
        self.kind() == ReleaseType::Compilation
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Release title cannot be empty".to_string());
        }
        if self.total_tracks < 0 {
            return Err("Track count cannot be negative".to_string());
        }
        self.release_type.parse::<ReleaseType>().map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Track {
    pub id: String,
    pub spotify_id: Option<String>,
    pub title: String,
    pub release_id: Option<String>,
    pub track_number: Option<i64>,
    pub duration_ms: i64,
    pub isrc: Option<String>,
    pub preview_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Track {
    pub fn new(title: impl Into<String>) -> Self {
        let ts = now();
        Self {
            id: Uuid::new_v4().to_string(),
            spotify_id: None,
            title: title.into(),
            release_id: None,
            track_number: None,
            duration_ms: 0,
            isrc: None,
            preview_url: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn with_spotify_id(mut self, spotify_id: impl Into<String>) -> Self {
        self.spotify_id = Some(spotify_id.into());
        self
    }

    pub fn with_release(mut self, release_id: impl Into<String>) -> Self {
        self.release_id = Some(release_id.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Track title cannot be empty".to_string());
        }
        if self.duration_ms < 0 {
            return Err("Duration cannot be negative".to_string());
        }
        Ok(())
    }
}

/// Artist credit on a release or track, as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ArtistCredit {
    pub artist_id: String,
    pub role: Option<String>,
}

impl ArtistCredit {
    /// Effective role (`NULL` → primary)
    pub fn role(&self) -> Result<ArtistRole, LibraryError> {
        ArtistRole::from_column(self.role.as_deref())
    }
}

// =============================================================================
// Upstream conversions
// =============================================================================

impl Artist {
    /// Find-or-create candidate for an upstream artist credit
    pub fn from_remote(credit: &ArtistRef) -> Self {
        Artist::new(credit.name.as_str()).with_spotify_id(credit.id.as_str())
    }
}

impl Release {
    /// Find-or-create candidate for an upstream album filed under `label_id`
    pub fn from_remote(album: &RemoteAlbum, label_id: &str) -> Self {
        let release_type = if album.is_compilation() {
            ReleaseType::Compilation
        } else {
            ReleaseType::from_upstream(&album.album_type)
        };

        let mut release = Release::new(album.name.as_str(), release_type)
            .with_spotify_id(album.id.as_str())
            .with_label(label_id);
        release.release_date = album.release_date.clone();
        release.artwork_url = album.image_url.clone();
        release.total_tracks = i64::from(album.total_tracks);
        release
    }
}

impl Track {
    pub fn from_remote(track: &RemoteTrack, release_id: &str) -> Self {
        let mut row = Track::new(track.name.as_str())
            .with_spotify_id(track.id.as_str())
            .with_release(release_id);
        row.track_number = track.track_number.map(i64::from);
        row.duration_ms = i64::try_from(track.duration_ms).unwrap_or(i64::MAX);
        row.isrc = track.isrc.clone();
        row.preview_url = track.preview_url.clone();
        row
    }
}

// =============================================================================
// Tests
// =============================================================================
