//! Credit roles for imported tracks and releases
//!
//! The upstream API lists artists without roles. Roles are inferred:
//!
//! - the first listed track artist is `primary`
//! - an artist named in a remix suffix of the title (`"Song (X Remix)"`,
//!   `"Song [X Remix]"`, `"Song - X Remix"`) is `remixer`
//! - everyone else on the track is `featured`
//! - album artists are `primary` on the release

use bridge_traits::catalog::{ArtistRef, RemoteAlbum, RemoteTrack};
use core_library::ArtistRole;

/// Names credited in a remix suffix, lowercased
fn remix_credit(title: &str) -> Option<String> {
    let lower = title.to_lowercase();

    for (open, close) in [('(', ')'), ('[', ']')] {
        let Some(end) = lower.rfind(close) else {
            continue;
        };
        let Some(start) = lower[..end].rfind(open) else {
            continue;
        };
        if let Some(names) = lower[start + 1..end].trim().strip_suffix("remix") {
            return Some(names.trim().to_string());
        }
    }

    let (_, tail) = lower.rsplit_once(" - ")?;
    tail.trim()
        .strip_suffix("remix")
        .map(|names| names.trim().to_string())
}

/// Track artists paired with their inferred roles, in listed order
pub fn track_credits(track: &RemoteTrack) -> Vec<(&ArtistRef, ArtistRole)> {
    let remixers = remix_credit(&track.name).unwrap_or_default();

    track
        .artists
        .iter()
        .enumerate()
        .map(|(index, artist)| {
            let name = artist.name.trim().to_lowercase();
            let role = if index == 0 {
                ArtistRole::Primary
            } else if !name.is_empty() && remixers.contains(&name) {
                ArtistRole::Remixer
            } else {
                ArtistRole::Featured
            };
            (artist, role)
        })
        .collect()
}

pub fn release_credits(album: &RemoteAlbum) -> Vec<(&ArtistRef, ArtistRole)> {
    album
        .artists
        .iter()
        .map(|artist| (artist, ArtistRole::Primary))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist(name: &str) -> ArtistRef {
        ArtistRef {
            id: name.to_lowercase(),
            name: name.to_string(),
        }
    }

    fn track(name: &str, artists: &[&str]) -> RemoteTrack {
        RemoteTrack {
            id: "t1".to_string(),
            name: name.to_string(),
            artists: artists.iter().map(|a| artist(a)).collect(),
            album: None,
            duration_ms: 0,
            track_number: None,
            popularity: None,
            preview_url: None,
            isrc: None,
            external_url: None,
        }
    }

    fn roles(track: &RemoteTrack) -> Vec<ArtistRole> {
        track_credits(track).into_iter().map(|(_, role)| role).collect()
    }

    #[test]
    fn test_remix_suffixes() {
        assert_eq!(remix_credit("Lights (Mosaic Remix)").as_deref(), Some("mosaic"));
        assert_eq!(
            remix_credit("Lights [Kern & Vox Extended Remix]").as_deref(),
            Some("kern & vox extended")
        );
        assert_eq!(remix_credit("Lights - Mosaic Remix").as_deref(), Some("mosaic"));
        assert_eq!(remix_credit("Lights (Original Mix)"), None);
        assert_eq!(remix_credit("Lights"), None);
    }

    #[test]
    fn test_track_roles() {
        assert_eq!(
            roles(&track("Lights (Mosaic Remix)", &["Aya", "Mosaic"])),
            vec![ArtistRole::Primary, ArtistRole::Remixer]
        );
        assert_eq!(
            roles(&track("Lights", &["Aya", "Mosaic"])),
            vec![ArtistRole::Primary, ArtistRole::Featured]
        );
        assert_eq!(
            roles(&track("Lights - Vox Remix", &["Aya", "Kern", "Vox"])),
            vec![ArtistRole::Primary, ArtistRole::Featured, ArtistRole::Remixer]
        );
    }

    #[test]
    fn test_first_artist_stays_primary_on_own_remix() {
        assert_eq!(
            roles(&track("Lights (Aya Remix)", &["Aya"])),
            vec![ArtistRole::Primary]
        );
    }
}
