//! Web API response types
//!
//! Data structures for deserializing the upstream catalog API. Only the
//! fields the catalog uses are declared; everything else is ignored.

use bridge_traits::catalog::{AlbumRef, ArtistRef, RemoteAlbum, RemoteArtist, RemoteTrack};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalIds {
    pub isrc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Followers {
    pub total: Option<u64>,
}

/// Artist as embedded in track and album objects
#[derive(Debug, Clone, Deserialize)]
pub struct SimplifiedArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimplifiedAlbum {
    pub id: String,
    pub name: String,
}

/// Paging object wrapping every list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u32,
    pub next: Option<String>,
}

impl<T> Default for Paging<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            next: None,
        }
    }
}

/// Full or simplified track. Playlist entries for local files carry no id.
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    pub album: Option<SimplifiedAlbum>,
    #[serde(default)]
    pub duration_ms: u64,
    pub track_number: Option<u32>,
    pub popularity: Option<u32>,
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_ids: ExternalIds,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
    #[serde(default)]
    pub followers: Followers,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_type: String,
    pub label: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub tracks: Paging<Track>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// `GET /search?type=album`
#[derive(Debug, Deserialize)]
pub struct AlbumSearchResponse {
    #[serde(default)]
    pub albums: Paging<SimplifiedAlbum>,
}

/// Entry of `GET /playlists/{id}/tracks`; `track` is null for removed items
#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<Track>,
}

/// Error envelope: `{"error": {"status": 404, "message": "..."}}`
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

fn artist_refs(artists: Vec<SimplifiedArtist>) -> Vec<ArtistRef> {
    artists
        .into_iter()
        .filter_map(|a| a.id.map(|id| ArtistRef { id, name: a.name }))
        .collect()
}

impl Track {
    /// Provider-neutral track; `None` for entries without an id
    pub fn into_remote(self, album_override: Option<&AlbumRef>) -> Option<RemoteTrack> {
        let id = self.id?;
        let album = album_override.cloned().or_else(|| {
            self.album.map(|a| AlbumRef {
                id: a.id,
                name: a.name,
            })
        });

        Some(RemoteTrack {
            id,
            name: self.name,
            artists: artist_refs(self.artists),
            album,
            duration_ms: self.duration_ms,
            track_number: self.track_number,
            popularity: self.popularity,
            preview_url: self.preview_url,
            isrc: self.external_ids.isrc,
            external_url: self.external_urls.spotify,
        })
    }
}

impl From<Artist> for RemoteArtist {
    fn from(artist: Artist) -> Self {
        RemoteArtist {
            id: artist.id,
            name: artist.name,
            genres: artist.genres,
            popularity: artist.popularity,
            followers: artist.followers.total,
            image_url: artist.images.into_iter().next().map(|i| i.url),
            external_url: artist.external_urls.spotify,
        }
    }
}

impl Album {
    /// Provider-neutral album with the given (fully paged) track list
    pub fn into_remote(self, tracks: Vec<Track>) -> RemoteAlbum {
        let album_ref = AlbumRef {
            id: self.id.clone(),
            name: self.name.clone(),
        };

        RemoteAlbum {
            id: self.id,
            name: self.name,
            album_type: self.album_type,
            label: self.label,
            release_date: self.release_date,
            total_tracks: self.total_tracks,
            artists: artist_refs(self.artists),
            tracks: tracks
                .into_iter()
                .filter_map(|t| t.into_remote(Some(&album_ref)))
                .collect(),
            image_url: self.images.into_iter().next().map(|i| i.url),
            external_url: self.external_urls.spotify,
        }
    }
}
