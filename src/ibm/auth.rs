//! IBM Cloud Authentication
//!
//! Exchanges an IBM Cloud API key for an IAM bearer token, or uses a
//! pre-issued token supplied by the caller.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::http::ApiError;

/// Default IAM endpoint
pub const DEFAULT_IAM_ENDPOINT: &str = "https://iam.cloud.ibm.com";

/// OAuth grant type for API key exchange
const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Token TTL used when IAM does not report `expires_in`
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(20 * 60);

enum TokenSource {
    ApiKey { api_key: String, iam_endpoint: String },
    Static(String),
}

/// Marks an error as "no usable bearer token", as opposed to a failed
/// service call
#[derive(Debug, thiserror::Error)]
#[error("Failed to obtain IAM access token")]
pub struct TokenUnavailable;

/// Whether `error` came from obtaining credentials rather than from the
/// service itself
pub fn is_auth_failure(error: &anyhow::Error) -> bool {
    error.downcast_ref::<TokenUnavailable>().is_some()
}

#[derive(Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// IBM Cloud credentials holder with token caching
#[derive(Clone)]
pub struct IbmCredentials {
    source: Arc<TokenSource>,
    http: Client,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl IbmCredentials {
    /// Credentials that exchange `api_key` at `iam_endpoint` on demand
    pub fn from_api_key(api_key: &str, iam_endpoint: &str, http: Client) -> Self {
        Self {
            source: Arc::new(TokenSource::ApiKey {
                api_key: api_key.to_string(),
                iam_endpoint: iam_endpoint.trim_end_matches('/').to_string(),
            }),
            http,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Credentials backed by a pre-issued bearer token
    pub fn from_token(token: &str, http: Client) -> Self {
        let token = token
            .strip_prefix("Bearer ")
            .unwrap_or(token)
            .trim()
            .to_string();
        Self {
            source: Arc::new(TokenSource::Static(token)),
            http,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String> {
        let (api_key, iam_endpoint) = match self.source.as_ref() {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::ApiKey {
                api_key,
                iam_endpoint,
            } => (api_key, iam_endpoint),
        };

        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached IAM token expired, fetching new token");
            }
        }

        let (token, ttl) = self.request_token(api_key, iam_endpoint).await?;
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New IAM token cached, expires in ~{} minutes",
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }

    async fn request_token(&self, api_key: &str, iam_endpoint: &str) -> Result<(String, Duration)> {
        let url = format!("{}/identity/token", iam_endpoint);
        tracing::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("grant_type", APIKEY_GRANT_TYPE), ("apikey", api_key)])
            .send()
            .await
            .context("Failed to reach IAM token endpoint")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read IAM token response")?;

        if !status.is_success() {
            // The body may echo request details; only the status is logged
            tracing::error!("IAM token exchange failed: {}", status);
            return Err(ApiError::new(status, &body).into());
        }

        let parsed: IamTokenResponse =
            serde_json::from_str(&body).context("Failed to parse IAM token response")?;

        let ttl = parsed
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);

        Ok((parsed.access_token, ttl))
    }
}
