//! Catalog Web API connector implementation
//!
//! Implements the `CatalogProvider` trait over the upstream REST API.

use async_trait::async_trait;
use bridge_traits::catalog::{CatalogProvider, RemoteAlbum, RemoteArtist, RemoteTrack};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use core_auth::TokenProvider;
use core_runtime::config::UpstreamConfig;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SpotifyError};
use crate::types::{Album, AlbumSearchResponse, Artist, ErrorEnvelope, Paging, PlaylistItem, Track};

/// The search endpoint refuses offsets past this value
const SEARCH_OFFSET_LIMIT: u32 = 1000;

/// Upstream catalog connector
///
/// # Features
///
/// - Bearer token from a shared [`TokenProvider`]; a 401 invalidates it once
///   and retries the call once
/// - 503 retried with exponential backoff capped by the configured ceiling
/// - 429 retried after the `Retry-After` delay given by the server
/// - Every other failure propagated as [`BridgeError::Upstream`]
///
/// # Example
///
/// ```ignore
/// use provider_spotify::SpotifyConnector;
/// use bridge_traits::catalog::CatalogProvider;
///
/// let connector = SpotifyConnector::new(http_client, token_cache, upstream_config);
/// let albums = connector.search_albums_by_label("Build It Tech").await?;
/// ```
pub struct SpotifyConnector {
    http_client: Arc<dyn HttpClient>,
    tokens: Arc<dyn TokenProvider>,
    config: UpstreamConfig,
}

impl SpotifyConnector {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        tokens: Arc<dyn TokenProvider>,
        config: UpstreamConfig,
    ) -> Self {
        Self {
            http_client,
            tokens,
            config,
        }
    }

    fn backoff(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.config.max_attempts.max(1),
            base_delay: self.config.backoff_base,
            max_delay: self.config.backoff_cap,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Upstream error message from the JSON envelope, or the raw body
    fn error_message(response: &HttpResponse) -> String {
        if let Ok(envelope) = response.json::<ErrorEnvelope>() {
            if let Some(message) = envelope.error.message {
                return message;
            }
        }
        String::from_utf8_lossy(&response.body).trim().to_string()
    }

    /// GET `url` with authentication and status-driven retries
    #[instrument(skip(self), fields(url = %url))]
    async fn send(&self, url: &str) -> Result<HttpResponse> {
        let policy = self.backoff();
        let mut attempt = 1u32;
        let mut reauthenticated = false;

        loop {
            let token = self.tokens.access_token().await?;
            let request = HttpRequest::new(HttpMethod::Get, url)
                .bearer_token(token)
                .header("Accept", "application/json")
                .timeout(self.config.request_timeout);

            let response = self.http_client.execute(request).await?;
            let status = response.status;

            if response.is_success() {
                debug!(status, "API request succeeded");
                return Ok(response);
            }

            let delay = match status {
                401 if !reauthenticated => {
                    warn!("Access token rejected, re-authenticating once");
                    self.tokens.invalidate().await;
                    reauthenticated = true;
                    continue;
                }
                503 if attempt < policy.max_attempts => policy.delay_for(attempt),
                429 if attempt < policy.max_attempts => response
                    .retry_after()
                    .unwrap_or_else(|| policy.delay_for(attempt)),
                _ => {
                    let message = Self::error_message(&response);
                    warn!(status, attempt, %message, "API request failed");
                    return Err(SpotifyError::Api { status, message });
                }
            };

            warn!(
                status,
                attempt,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "API request throttled, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send(url).await?;
        serde_json::from_slice(&response.body)
            .map_err(|e| SpotifyError::Parse(format!("{}: {}", url, e)))
    }

    /// Follow `next` links until the listing is exhausted
    async fn collect_pages<T: DeserializeOwned>(&self, first: Paging<T>) -> Result<Vec<T>> {
        let mut items = first.items;
        let mut next = first.next;

        while let Some(url) = next {
            let page: Paging<T> = self.get_json(&url).await?;
            items.extend(page.items);
            next = page.next;
        }
        Ok(items)
    }

    /// Album ids from the paged label search, deduplicated in result order
    async fn search_album_ids(&self, label_name: &str) -> Result<Vec<String>> {
        let query = format!("label:\"{}\"", label_name);
        let page_size = self.config.search_page_size.max(1);
        let mut offset = 0u32;
        let mut seen = HashSet::new();
        let mut ids = Vec::new();

        loop {
            let url = self.url(&format!(
                "/search?q={}&type=album&limit={}&offset={}",
                urlencoding::encode(&query),
                page_size,
                offset
            ));
            let response: AlbumSearchResponse = self.get_json(&url).await?;
            let page = response.albums;
            let returned = page.items.len() as u32;

            for album in page.items {
                if seen.insert(album.id.clone()) {
                    ids.push(album.id);
                }
            }

            offset += page_size;
            debug!(offset, total = page.total, returned, "search page fetched");
            if returned == 0 || offset >= page.total || offset >= SEARCH_OFFSET_LIMIT {
                break;
            }
            tokio::time::sleep(self.config.page_delay).await;
        }

        Ok(ids)
    }

    async fn fetch_album(&self, id: &str) -> Result<RemoteAlbum> {
        let mut album: Album = self
            .get_json(&self.url(&format!("/albums/{}", urlencoding::encode(id))))
            .await?;
        let first_page = std::mem::take(&mut album.tracks);
        let tracks = self.collect_pages(first_page).await?;
        Ok(album.into_remote(tracks))
    }
}

#[async_trait]
impl CatalogProvider for SpotifyConnector {
    #[instrument(skip(self))]
    async fn get_track(&self, id: &str) -> BridgeResult<RemoteTrack> {
        let track: Track = self
            .get_json(&self.url(&format!("/tracks/{}", urlencoding::encode(id))))
            .await?;
        track
            .into_remote(None)
            .ok_or_else(|| BridgeError::Serialization(format!("track {} has no id", id)))
    }

    #[instrument(skip(self))]
    async fn get_artist(&self, id: &str) -> BridgeResult<RemoteArtist> {
        let artist: Artist = self
            .get_json(&self.url(&format!("/artists/{}", urlencoding::encode(id))))
            .await?;
        Ok(artist.into())
    }

    #[instrument(skip(self))]
    async fn get_album(&self, id: &str) -> BridgeResult<RemoteAlbum> {
        Ok(self.fetch_album(id).await?)
    }

    #[instrument(skip(self))]
    async fn search_albums_by_label(&self, label_name: &str) -> BridgeResult<Vec<RemoteAlbum>> {
        let ids = self.search_album_ids(label_name).await?;
        info!(candidates = ids.len(), "Label search returned candidate albums");

        let mut albums = Vec::new();
        for id in ids {
            let album = match self.fetch_album(&id).await {
                Ok(album) => album,
                Err(SpotifyError::Api { status: 404, .. }) => {
                    warn!(album_id = %id, "Album vanished between search and fetch");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if album.label_matches(label_name) {
                albums.push(album);
            } else {
                debug!(album_id = %id, label = ?album.label, "Skipping album from another label");
            }
        }

        info!(matched = albums.len(), "Label search complete");
        Ok(albums)
    }

    #[instrument(skip(self))]
    async fn playlist_tracks(&self, playlist_id: &str) -> BridgeResult<Vec<RemoteTrack>> {
        let url = self.url(&format!(
            "/playlists/{}/tracks?limit={}&offset=0",
            urlencoding::encode(playlist_id),
            self.config.playlist_page_size
        ));
        let first: Paging<PlaylistItem> = self.get_json(&url).await?;
        let items = self.collect_pages(first).await?;

        Ok(items
            .into_iter()
            .filter_map(|item| item.track)
            .filter_map(|track| track.into_remote(None))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use core_auth::AuthError;
    use mockall::mock;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    /// Hands out `token-N`, counting exchanges and invalidations
    #[derive(Default)]
    struct CountingTokens {
        issued: AtomicUsize,
        current: Mutex<Option<String>>,
        invalidated: AtomicUsize,
    }

    #[async_trait]
    impl TokenProvider for CountingTokens {
        async fn access_token(&self) -> core_auth::Result<String> {
            let mut current = self.current.lock().unwrap();
            if let Some(token) = current.as_ref() {
                return Ok(token.clone());
            }
            let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
            let token = format!("token-{n}");
            *current = Some(token.clone());
            Ok(token)
        }

        async fn invalidate(&self) {
            self.invalidated.fetch_add(1, Ordering::SeqCst);
            self.current.lock().unwrap().take();
        }
    }

    struct FailingTokens;

    #[async_trait]
    impl TokenProvider for FailingTokens {
        async fn access_token(&self) -> core_auth::Result<String> {
            Err(AuthError::TokenRequestFailed {
                status: Some(400),
                message: "invalid_client".to_string(),
            })
        }

        async fn invalidate(&self) {}
    }

    /// Replays canned responses in order and records every request
    #[derive(Default)]
    struct ScriptedHttpClient {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn with(responses: Vec<HttpResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn urls(&self) -> Vec<String> {
            self.requests.lock().unwrap().iter().map(|r| r.url.clone()).collect()
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedHttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| BridgeError::OperationFailed("script exhausted".to_string()))
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn config() -> UpstreamConfig {
        UpstreamConfig::new("id", "secret")
            .with_endpoints("https://auth.test/token", "https://api.test/v1")
            .with_backoff(3, Duration::from_millis(1), Duration::from_millis(5))
            .with_page_delay(Duration::from_millis(0))
    }

    fn album_json(id: &str, label: &str) -> String {
        format!(
            r#"{{"id": "{id}", "name": "Album {id}", "album_type": "single", "label": "{label}",
                "release_date": "2024-01-01", "total_tracks": 1,
                "artists": [{{"id": "art1", "name": "Nova"}}],
                "tracks": {{"items": [{{"id": "trk-{id}", "name": "Track {id}", "duration_ms": 1000,
                            "artists": [{{"id": "art1", "name": "Nova"}}]}}], "total": 1, "next": null}}}}"#
        )
    }

    fn connector(http: Arc<dyn HttpClient>, tokens: Arc<dyn TokenProvider>) -> SpotifyConnector {
        SpotifyConnector::new(http, tokens, config())
    }

    #[tokio::test]
    async fn test_get_artist_success() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|req| {
                assert_eq!(req.url, "https://api.test/v1/artists/art1");
                assert_eq!(
                    req.headers.get("Authorization"),
                    Some(&"Bearer token-1".to_string())
                );
                Ok(response(
                    200,
                    r#"{"id": "art1", "name": "Nova", "genres": ["techno"],
                        "followers": {"total": 1200}, "images": [{"url": "https://img/a"}]}"#,
                ))
            });

        let connector = connector(Arc::new(mock_http), Arc::new(CountingTokens::default()));
        let artist = connector.get_artist("art1").await.unwrap();

        assert_eq!(artist.name, "Nova");
        assert_eq!(artist.followers, Some(1200));
        assert_eq!(artist.image_url.as_deref(), Some("https://img/a"));
    }

    #[tokio::test]
    async fn test_not_found_surfaces_status_and_message() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(response(
                404,
                r#"{"error": {"status": 404, "message": "non existing id"}}"#,
            ))
        });

        let connector = connector(Arc::new(mock_http), Arc::new(CountingTokens::default()));
        let err = connector.get_track("missing").await.unwrap_err();

        match err {
            BridgeError::Upstream { status, message } => {
                assert_eq!(status, Some(404));
                assert_eq!(message, "non existing id");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_reauthenticates_exactly_once() {
        let http = ScriptedHttpClient::with(vec![
            response(401, r#"{"error": {"status": 401, "message": "expired"}}"#),
            response(401, r#"{"error": {"status": 401, "message": "expired"}}"#),
        ]);
        let tokens = Arc::new(CountingTokens::default());
        let connector = connector(http.clone(), tokens.clone());

        let err = connector.get_artist("art1").await.unwrap_err();

        assert!(matches!(err, BridgeError::Upstream { status: Some(401), .. }));
        assert_eq!(tokens.invalidated.load(Ordering::SeqCst), 1);
        assert_eq!(tokens.issued.load(Ordering::SeqCst), 2);
        assert_eq!(http.urls().len(), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_then_success() {
        let http = ScriptedHttpClient::with(vec![
            response(401, ""),
            response(200, r#"{"id": "art1", "name": "Nova"}"#),
        ]);
        let tokens = Arc::new(CountingTokens::default());
        let connector = connector(http.clone(), tokens.clone());

        let artist = connector.get_artist("art1").await.unwrap();
        assert_eq!(artist.id, "art1");

        let requests = http.requests.lock().unwrap();
        assert_eq!(
            requests[1].headers.get("Authorization"),
            Some(&"Bearer token-2".to_string())
        );
    }

    #[tokio::test]
    async fn test_service_unavailable_is_retried_up_to_max_attempts() {
        let http = ScriptedHttpClient::with(vec![
            response(503, "busy"),
            response(503, "busy"),
            response(503, "still busy"),
        ]);
        let connector = connector(http.clone(), Arc::new(CountingTokens::default()));

        let err = connector.get_artist("art1").await.unwrap_err();
        assert!(matches!(err, BridgeError::Upstream { status: Some(503), .. }));
        assert_eq!(http.urls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_honours_retry_after() {
        let mut limited = response(429, "");
        limited
            .headers
            .insert("Retry-After".to_string(), "2".to_string());
        let http = ScriptedHttpClient::with(vec![
            limited,
            response(200, r#"{"id": "art1", "name": "Nova"}"#),
        ]);
        let connector = connector(http.clone(), Arc::new(CountingTokens::default()));

        let started = tokio::time::Instant::now();
        connector.get_artist("art1").await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(http.urls().len(), 2);
    }

    #[tokio::test]
    async fn test_token_failure_propagates() {
        let connector = connector(
            ScriptedHttpClient::with(vec![]),
            Arc::new(FailingTokens),
        );
        let err = connector.get_album("a1").await.unwrap_err();
        assert!(matches!(err, BridgeError::Upstream { status: Some(400), .. }));
    }

    #[tokio::test]
    async fn test_search_pages_then_filters_by_label() {
        let http = ScriptedHttpClient::with(vec![
            response(
                200,
                r#"{"albums": {"items": [{"id": "a1", "name": "A1"}, {"id": "a2", "name": "A2"}],
                               "total": 3, "next": "x"}}"#,
            ),
            response(
                200,
                r#"{"albums": {"items": [{"id": "a3", "name": "A3"}, {"id": "a1", "name": "A1"}],
                               "total": 3, "next": null}}"#,
            ),
            response(200, &album_json("a1", "Build It Tech")),
            response(200, &album_json("a2", "Some Other Label")),
            response(200, &album_json("a3", "BUILD IT TECH (Digital)")),
        ]);
        let connector = SpotifyConnector::new(
            http.clone(),
            Arc::new(CountingTokens::default()),
            config().with_search_page_size(2),
        );

        let albums = connector.search_albums_by_label("Build It Tech").await.unwrap();

        let ids: Vec<_> = albums.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
        assert_eq!(albums[0].tracks[0].id, "trk-a1");

        let urls = http.urls();
        assert_eq!(urls.len(), 5);
        assert!(urls[0].contains("q=label%3A%22Build%20It%20Tech%22"));
        assert!(urls[0].contains("offset=0"));
        assert!(urls[1].contains("offset=2"));
        assert!(urls[2].ends_with("/albums/a1"));
    }

    #[tokio::test]
    async fn test_search_with_no_results() {
        let http = ScriptedHttpClient::with(vec![response(
            200,
            r#"{"albums": {"items": [], "total": 0, "next": null}}"#,
        )]);
        let connector = connector(http, Arc::new(CountingTokens::default()));

        let albums = connector.search_albums_by_label("Brand New Label").await.unwrap();
        assert!(albums.is_empty());
    }

    #[tokio::test]
    async fn test_playlist_tracks_follow_next_and_skip_removed() {
        let http = ScriptedHttpClient::with(vec![
            response(
                200,
                r#"{"items": [
                        {"track": {"id": "t1", "name": "One", "duration_ms": 1}},
                        {"track": null}
                    ],
                    "total": 3,
                    "next": "https://api.test/v1/playlists/p1/tracks?offset=2&limit=2"}"#,
            ),
            response(
                200,
                r#"{"items": [{"track": {"id": "t3", "name": "Three", "duration_ms": 3}}],
                    "total": 3, "next": null}"#,
            ),
        ]);
        let connector = connector(http.clone(), Arc::new(CountingTokens::default()));

        let tracks = connector.playlist_tracks("p1").await.unwrap();
        let ids: Vec<_> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);

        let urls = http.urls();
        assert!(urls[0].contains("limit=100"));
        assert_eq!(urls[1], "https://api.test/v1/playlists/p1/tracks?offset=2&limit=2");
    }
}
