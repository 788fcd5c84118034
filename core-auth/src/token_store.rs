//! In-process Token Cache
//!
//! Holds the current client-credentials token for the lifetime of the process.
//! The token is not refreshed proactively: callers that receive a 401 call
//! [`TokenProvider::invalidate`] and ask again, which performs exactly one new
//! exchange.
//!
//! ## Example
//!
//! ```ignore
//! use core_auth::{ClientCredentials, ClientCredentialsFlow, TokenCache, TokenProvider};
//!
//! let cache = TokenCache::new(ClientCredentialsFlow::new(credentials, http_client));
//! let token = cache.access_token().await?;
//! ```

use crate::error::Result;
use crate::oauth::ClientCredentialsFlow;
use crate::types::AccessToken;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

/// Source of bearer tokens for upstream calls
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current bearer token, acquiring one if none is cached
    async fn access_token(&self) -> Result<String>;

    /// Drop the cached token so the next call re-authenticates
    async fn invalidate(&self);
}

/// Caches the token produced by a [`ClientCredentialsFlow`]
///
/// Concurrent callers that find the cache empty are serialised on the lock,
/// so only one exchange is in flight at a time.
pub struct TokenCache {
    flow: ClientCredentialsFlow,
    current: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(flow: ClientCredentialsFlow) -> Self {
        Self {
            flow,
            current: Mutex::new(None),
        }
    }

    /// Whether a token is currently held
    pub async fn has_token(&self) -> bool {
        self.current.lock().await.is_some()
    }
}

#[async_trait]
impl TokenProvider for TokenCache {
    async fn access_token(&self) -> Result<String> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref() {
            return Ok(token.secret().to_string());
        }

        debug!("No cached token, performing client-credentials exchange");
        let token = self.flow.request_token().await?;
        let secret = token.secret().to_string();
        *current = Some(token);
        Ok(secret)
    }

    async fn invalidate(&self) {
        debug!("Invalidating cached access token");
        self.current.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::ClientCredentials;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Issues `token-1`, `token-2`, ... on successive exchanges
    #[derive(Default)]
    struct CountingTokenEndpoint {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpClient for CountingTokenEndpoint {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from(format!(r#"{{"access_token":"token-{}"}}"#, n)),
            })
        }
    }

    fn cache(endpoint: Arc<CountingTokenEndpoint>) -> TokenCache {
        TokenCache::new(ClientCredentialsFlow::new(
            ClientCredentials::new("id", "secret", "https://auth.test/token"),
            endpoint,
        ))
    }

    #[tokio::test]
    async fn test_token_is_cached_until_invalidated() {
        let endpoint = Arc::new(CountingTokenEndpoint::default());
        let cache = cache(endpoint.clone());

        assert!(!cache.has_token().await);
        assert_eq!(cache.access_token().await.unwrap(), "token-1");
        assert_eq!(cache.access_token().await.unwrap(), "token-1");
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);

        cache.invalidate().await;
        assert!(!cache.has_token().await);
        assert_eq!(cache.access_token().await.unwrap(), "token-2");
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_exchange() {
        let endpoint = Arc::new(CountingTokenEndpoint::default());
        let cache = Arc::new(cache(endpoint.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.access_token().await.unwrap() })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "token-1");
        }
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
    }
}
