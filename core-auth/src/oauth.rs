//! OAuth 2.0 Client-Credentials Flow
//!
//! Exchanges an application's client id and secret for an app-scoped bearer
//! token. No user interaction and no refresh token are involved.
//!
//! ## Usage
//!
//! ```ignore
//! use core_auth::{ClientCredentials, ClientCredentialsFlow};
//! use std::sync::Arc;
//!
//! let flow = ClientCredentialsFlow::new(
//!     ClientCredentials::new("client-id", "client-secret", "https://accounts.spotify.com/api/token"),
//!     http_client,
//! );
//! let token = flow.request_token().await?;
//! ```

use crate::error::{AuthError, Result};
use crate::types::{AccessToken, TokenResponse};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

const MAX_ATTEMPTS: u32 = 3;

/// Application credentials for the client-credentials grant
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    client_secret: String,
    pub token_url: String,
}

impl ClientCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: token_url.into(),
        }
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Performs the token exchange against the provider's token endpoint
pub struct ClientCredentialsFlow {
    credentials: ClientCredentials,
    http_client: Arc<dyn HttpClient>,
}

impl ClientCredentialsFlow {
    pub fn new(credentials: ClientCredentials, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            credentials,
            http_client,
        }
    }

    fn encoded_body(&self) -> Result<Bytes> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        let encoded = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;
        Ok(Bytes::from(encoded))
    }

    /// Request a fresh app token.
    ///
    /// 5xx responses and transient transport failures are retried up to three
    /// times with `100ms * 2^n` backoff; 4xx responses fail immediately.
    #[instrument(skip(self), fields(client_id = %self.credentials.client_id))]
    pub async fn request_token(&self) -> Result<AccessToken> {
        let body = self.encoded_body()?;
        let mut attempts = 0;

        loop {
            attempts += 1;

            let request =
                HttpRequest::new(HttpMethod::Post, self.credentials.token_url.clone())
                    .header("Content-Type", "application/x-www-form-urlencoded")
                    .body(body.clone());

            let response = match self.http_client.execute(request).await {
                Ok(response) => response,
                Err(e) if e.is_transient() && attempts < MAX_ATTEMPTS => {
                    let delay = backoff(attempts);
                    warn!(error = %e, attempts, delay_ms = delay.as_millis() as u64, "Token request failed, retrying");
                    sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(AuthError::Http(e)),
            };

            if response.is_success() {
                let token: TokenResponse = response.json().map_err(|e| {
                    AuthError::InvalidResponse(format!("Failed to parse token response: {}", e))
                })?;

                info!(expires_in = token.expires_in, "Obtained client-credentials token");
                return Ok(AccessToken::new(
                    token.access_token,
                    token.token_type,
                    token.expires_in,
                ));
            }

            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            if response.is_client_error() {
                warn!(status, error = %error_body, "Token request rejected");
                return Err(AuthError::TokenRequestFailed {
                    status: Some(status),
                    message: error_body,
                });
            }

            if attempts >= MAX_ATTEMPTS {
                return Err(AuthError::TokenRequestFailed {
                    status: Some(status),
                    message: format!("failed after {} attempts: {}", attempts, error_body),
                });
            }

            let delay = backoff(attempts);
            debug!(status, attempts, delay_ms = delay.as_millis() as u64, "Token endpoint error, retrying");
            sleep(delay).await;
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(100 * 2u64.pow(attempt.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::HttpResponse;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Replays canned responses and records request bodies
    struct ScriptedHttpClient {
        responses: Mutex<Vec<BridgeResult<HttpResponse>>>,
        bodies: Mutex<Vec<String>>,
    }

    impl ScriptedHttpClient {
        fn new(mut responses: Vec<BridgeResult<HttpResponse>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                bodies: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedHttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            let body = request
                .body
                .map(|b| String::from_utf8(b.to_vec()).unwrap())
                .unwrap_or_default();
            self.bodies.lock().unwrap().push(body);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(BridgeError::OperationFailed("no more responses".into())))
        }
    }

    fn response(status: u16, body: &str) -> BridgeResult<HttpResponse> {
        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        })
    }

    fn flow(client: Arc<ScriptedHttpClient>) -> ClientCredentialsFlow {
        ClientCredentialsFlow::new(
            ClientCredentials::new("cid", "csecret", "https://auth.test/token"),
            client,
        )
    }

    #[tokio::test]
    async fn test_request_token_sends_client_credentials_grant() {
        let client = Arc::new(ScriptedHttpClient::new(vec![response(
            200,
            r#"{"access_token":"tok","token_type":"Bearer","expires_in":3600}"#,
        )]));

        let token = flow(client.clone()).request_token().await.unwrap();

        assert_eq!(token.secret(), "tok");
        let bodies = client.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains("grant_type=client_credentials"));
        assert!(bodies[0].contains("client_id=cid"));
    }

    #[tokio::test]
    async fn test_client_error_fails_fast() {
        let client = Arc::new(ScriptedHttpClient::new(vec![response(
            400,
            r#"{"error":"invalid_client"}"#,
        )]));

        let err = flow(client.clone()).request_token().await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("invalid_client"));
        assert_eq!(client.bodies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            response(502, "bad gateway"),
            response(200, r#"{"access_token":"second"}"#),
        ]));

        let token = flow(client.clone()).request_token().await.unwrap();

        assert_eq!(token.secret(), "second");
        assert_eq!(client.bodies.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = ClientCredentials::new("cid", "csecret", "https://auth.test/token");
        assert!(!format!("{:?}", creds).contains("csecret"));
    }
}
