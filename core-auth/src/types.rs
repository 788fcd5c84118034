use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer token obtained through the client-credentials grant.
///
/// The expiry is recorded for diagnostics only; the token is used until the
/// upstream rejects it with a 401.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    pub token_type: String,
    pub obtained_at: DateTime<Utc>,
    pub expires_in: i64,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, token_type: impl Into<String>, expires_in: i64) -> Self {
        Self {
            value: value.into(),
            token_type: token_type.into(),
            obtained_at: Utc::now(),
            expires_in,
        }
    }

    /// Raw token for the `Authorization` header
    pub fn secret(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.obtained_at + chrono::Duration::seconds(self.expires_in)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("obtained_at", &self.obtained_at)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// JSON body returned by the token endpoint
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_expires_in() -> i64 {
    3600
}
