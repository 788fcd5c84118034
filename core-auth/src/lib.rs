//! # Authentication Module
//!
//! App-level credentials for the upstream music-metadata API.
//!
//! ## Overview
//!
//! The upstream API is accessed with an application token obtained through the
//! OAuth 2.0 client-credentials grant. This crate performs that exchange and
//! keeps the resulting token in an explicitly owned [`TokenCache`] that is
//! constructed once and handed to the connector.
//!
//! ## Features
//!
//! - Client-credentials exchange with retry on 5xx responses
//! - Process-lifetime token caching, no proactive refresh
//! - Explicit invalidation for 401-driven re-authentication
//! - Secrets redacted from `Debug` output and logs

pub mod error;
pub mod oauth;
pub mod token_store;
pub mod types;

pub use error::{AuthError, Result};
pub use oauth::{ClientCredentials, ClientCredentialsFlow};
pub use token_store::{TokenCache, TokenProvider};
pub use types::AccessToken;
