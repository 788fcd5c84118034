//! Façade-level flows: import, then read back through cache and attribution

use anyhow::Result;
use async_trait::async_trait;
use bridge_desktop::MemoryCacheBackend;
use bridge_traits::catalog::{
    ArtistRef, CatalogProvider, EntityKind, RemoteAlbum, RemoteArtist, RemoteTrack,
};
use bridge_traits::error::Result as BridgeResult;
use core_cache::Source;
use core_library::db::create_test_pool;
use core_runtime::config::CacheConfig;
use core_service::{CatalogService, CoreError};
use core_sync::ImportStatus;
use std::sync::Arc;

mockall::mock! {
    Provider {}

    #[async_trait]
    impl CatalogProvider for Provider {
        async fn get_track(&self, id: &str) -> BridgeResult<RemoteTrack>;
        async fn get_artist(&self, id: &str) -> BridgeResult<RemoteArtist>;
        async fn get_album(&self, id: &str) -> BridgeResult<RemoteAlbum>;
        async fn search_albums_by_label(&self, label_name: &str) -> BridgeResult<Vec<RemoteAlbum>>;
        async fn playlist_tracks(&self, playlist_id: &str) -> BridgeResult<Vec<RemoteTrack>>;
    }
}

fn credit(id: &str, name: &str) -> ArtistRef {
    ArtistRef {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn track(id: &str, name: &str, artists: Vec<ArtistRef>) -> RemoteTrack {
    RemoteTrack {
        id: id.to_string(),
        name: name.to_string(),
        artists,
        album: None,
        duration_ms: 300_000,
        track_number: Some(1),
        popularity: None,
        preview_url: None,
        isrc: None,
        external_url: None,
    }
}

fn release(id: &str, date: &str, tracks: Vec<RemoteTrack>) -> RemoteAlbum {
    RemoteAlbum {
        id: id.to_string(),
        name: format!("Release {}", id),
        album_type: "single".to_string(),
        label: Some("Build It Deep".to_string()),
        release_date: Some(date.to_string()),
        total_tracks: tracks.len() as u32,
        artists: vec![credit("ar-kern", "Kern")],
        tracks,
        image_url: None,
        external_url: None,
    }
}

async fn service(provider: MockProvider) -> Result<CatalogService> {
    let pool = create_test_pool().await?;
    Ok(CatalogService::from_parts(
        pool,
        Arc::new(MemoryCacheBackend::new()),
        Arc::new(provider),
        &CacheConfig::default(),
    ))
}

#[tokio::test]
async fn test_import_then_query() -> Result<()> {
    let mut provider = MockProvider::new();
    provider
        .expect_search_albums_by_label()
        .withf(|name| name == "Build It Deep")
        .returning(|_| {
            Ok(vec![
                release(
                    "al-old",
                    "2021-01-01",
                    vec![track("t1", "Dusk", vec![credit("ar-kern", "Kern")])],
                ),
                release(
                    "al-new",
                    "2024-06-01",
                    vec![track(
                        "t2",
                        "Dawn (Vox Remix)",
                        vec![credit("ar-kern", "Kern"), credit("ar-vox", "Vox")],
                    )],
                ),
            ])
        });
    let catalog = service(provider).await?;

    let result = catalog.run_import("bid").await?;
    assert_eq!(result.status, ImportStatus::Completed);
    assert_eq!(result.label_id, "buildit-deep");

    let artists = catalog.artists_for_label("Build It Deep", 10, 0).await?;
    assert_eq!(
        artists.items.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
        vec!["Kern"]
    );

    let releases = catalog.releases_for_label("buildit-deep", 10, 0).await?;
    assert_eq!(releases.total, 2);
    assert_eq!(releases.items[0].spotify_id.as_deref(), Some("al-new"));

    let cached = catalog.get_for_label(EntityKind::Track, "buildit-deep").await?;
    assert_eq!(cached.len(), 2);

    let latest = catalog.latest_import("Build It Deep").await?.expect("logged run");
    assert_eq!(latest.status, ImportStatus::Completed);
    Ok(())
}

#[tokio::test]
async fn test_entity_reads_go_through_cache() -> Result<()> {
    let mut provider = MockProvider::new();
    provider
        .expect_get_track()
        .times(1)
        .returning(|id| Ok(track(id, "Dusk", vec![credit("ar-kern", "Kern")])));
    let catalog = service(provider).await?;

    let first = catalog.get_entity(EntityKind::Track, "t1").await?;
    let second = catalog.get_entity(EntityKind::Track, "t1").await?;
    assert_eq!(first.source, Source::Upstream);
    assert_eq!(second.source, Source::Cache);

    assert_eq!(catalog.clear_all().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_label_is_a_client_error() -> Result<()> {
    let catalog = service(MockProvider::new()).await?;

    let err = catalog
        .artists_for_label("Definitely Not A Label", 10, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Attribution(_)));
    assert!(err.is_client_error());
    Ok(())
}
