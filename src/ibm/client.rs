//! IBM Cloud client session
//!
//! Combines authentication and HTTP functionality, and hands out one
//! [`ServiceClient`] per IBM Cloud service.

use super::auth::{IbmCredentials, TokenUnavailable, DEFAULT_IAM_ENDPOINT};
use super::http::IbmHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Region used when nothing else is configured
pub const DEFAULT_REGION: &str = "us-south";

/// Everything needed to open a session, already resolved from flags,
/// environment and config file
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub api_key: Option<String>,
    pub iam_token: Option<String>,
    pub region: String,
    pub iam_endpoint: Option<String>,
    pub event_notifications_endpoint: Option<String>,
    pub schematics_endpoint: Option<String>,
}

impl SessionConfig {
    /// Event Notifications base URL for the configured region
    pub fn event_notifications_url(&self) -> String {
        self.event_notifications_endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://{}.event-notifications.cloud.ibm.com/event-notifications",
                self.region
            )
        })
    }

    /// Schematics base URL for the configured region
    pub fn schematics_url(&self) -> String {
        self.schematics_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.schematics.cloud.ibm.com", self.region))
    }

    pub fn iam_url(&self) -> String {
        self.iam_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_IAM_ENDPOINT.to_string())
    }
}

/// Shared connection state for every data source read
#[derive(Clone)]
pub struct ClientSession {
    http: IbmHttpClient,
    credentials: Option<IbmCredentials>,
    config: SessionConfig,
}

impl ClientSession {
    /// Open a session. Missing credentials are not an error here; they
    /// surface when a service client is requested.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let http = IbmHttpClient::new()?;

        let credentials = match (&config.iam_token, &config.api_key) {
            (Some(token), _) if !token.trim().is_empty() => {
                Some(IbmCredentials::from_token(token, http.inner().clone()))
            }
            (_, Some(api_key)) if !api_key.trim().is_empty() => Some(IbmCredentials::from_api_key(
                api_key,
                &config.iam_url(),
                http.inner().clone(),
            )),
            _ => None,
        };

        tracing::debug!(
            "Session opened: region={}, credentials={}",
            config.region,
            credentials.is_some()
        );

        Ok(Self {
            http,
            credentials,
            config,
        })
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    /// Client for the Event Notifications API
    pub fn event_notifications_api(&self) -> Result<ServiceClient> {
        self.service_client("Event Notifications", &self.config.event_notifications_url())
    }

    /// Client for the Schematics API
    pub fn schematics_api(&self) -> Result<ServiceClient> {
        self.service_client("Schematics", &self.config.schematics_url())
    }

    fn service_client(&self, service: &str, base_url: &str) -> Result<ServiceClient> {
        let credentials = self.credentials.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "No IBM Cloud credentials configured for {}. Set IC_API_KEY or IC_IAM_TOKEN",
                service
            )
        })?;

        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid {} endpoint: {}", service, base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow::anyhow!("Invalid {} endpoint: {}", service, base_url));
        }

        Ok(ServiceClient {
            base_url,
            credentials,
            http: self.http.clone(),
        })
    }
}

/// Authenticated client bound to one service endpoint
#[derive(Clone)]
pub struct ServiceClient {
    base_url: Url,
    credentials: IbmCredentials,
    http: IbmHttpClient,
}

impl ServiceClient {
    /// Build a URL under the service base, percent-encoding each segment
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Make a GET request to the service
    pub async fn get(&self, url: &Url) -> Result<Value> {
        let token = self.credentials.get_token().await.context(TokenUnavailable)?;
        self.http.get(url, &token).await
    }
}
