//! HTTP utilities for IBM Cloud REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Maximum length of a service error message carried into diagnostics
const MAX_ERROR_MESSAGE_LENGTH: usize = 160;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = floor_char_boundary(body, MAX_LOG_BODY_LENGTH);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// A non-success HTTP status returned by an IBM Cloud service
#[derive(Debug, Clone, thiserror::Error)]
#[error("API request failed: {status}{}", message_suffix(.message))]
pub struct ApiError {
    pub status: StatusCode,
    /// First human-readable message found in the error body, if any
    pub message: Option<String>,
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" - {}", m))
        .unwrap_or_default()
}

impl ApiError {
    pub fn new(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            message: extract_error_message(body),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

/// Pull the service message out of an IBM error body.
///
/// Platform services answer with `{"errors": [{"code", "message"}], "trace"}`,
/// Schematics with `{"messages": [{"message"}]}` or a bare `{"message"}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let message = ["errors", "messages"]
        .iter()
        .find_map(|key| {
            value
                .get(key)
                .and_then(|v| v.as_array())
                .and_then(|arr| arr.first())
                .and_then(|first| first.get("message"))
                .and_then(|m| m.as_str())
        })
        .or_else(|| value.get("message").and_then(|m| m.as_str()))
        .or_else(|| value.get("error").and_then(|m| m.as_str()))?;

    let cleaned: String = message
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(MAX_ERROR_MESSAGE_LENGTH)
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Whether any error in the chain is an [`ApiError`] with status 404
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|e| e.downcast_ref::<ApiError>().is_some_and(ApiError::is_not_found))
}

/// Status code of the first [`ApiError`] in the chain
pub fn api_status(error: &anyhow::Error) -> Option<StatusCode> {
    error
        .chain()
        .find_map(|e| e.downcast_ref::<ApiError>().map(|api| api.status))
}

/// HTTP client wrapper for IBM Cloud API calls
#[derive(Clone)]
pub struct IbmHttpClient {
    client: Client,
}

impl IbmHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ibm-datasource/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Underlying reqwest client, shared with the IAM token exchange
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Make a GET request to an IBM Cloud API
    pub async fn get(&self, url: &Url, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // 404 is an expected outcome for some reads; keep it out of the error log
            if status == StatusCode::NOT_FOUND {
                tracing::debug!("API not found: {} - {}", status, sanitize_for_log(&body));
            } else {
                tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            }
            return Err(ApiError::new(status, &body).into());
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format an IBM Cloud API error for display
pub fn format_ibm_error(error: &anyhow::Error) -> String {
    if let Some(status) = api_status(error) {
        return match status.as_u16() {
            400 => "Invalid request. Check the data source attributes.".to_string(),
            401 => "Authentication failed. Check IC_API_KEY or the IAM token.".to_string(),
            403 => "Permission denied. Check your IBM Cloud IAM access policies.".to_string(),
            404 => "Resource not found.".to_string(),
            409 => "Resource conflict.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            500..=599 => "IBM Cloud service temporarily unavailable. Please try again.".to_string(),
            _ => "Request failed. Check your network connection and try again.".to_string(),
        };
    }

    let error_str = error.to_string();
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("500 bytes total"));
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        assert_eq!(sanitize_for_log("a\nb\tc d"), "abc d");
    }

    #[test]
    fn test_extract_platform_error_message() {
        let body = r#"{"errors":[{"code":"not_found","message":"Instance not found"}],"trace":"abc"}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("Instance not found"));
    }

    #[test]
    fn test_extract_schematics_error_message() {
        let body = r#"{"requestid":"r1","status_code":404,"messages":[{"message":"Agent not found"}]}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("Agent not found"));
        assert_eq!(extract_error_message("not json"), None);
    }

    #[test]
    fn test_is_not_found_through_context() {
        let err = anyhow::Error::from(ApiError::new(StatusCode::NOT_FOUND, ""))
            .context("get_agent_data failed");
        assert!(is_not_found(&err));

        let err = anyhow::Error::from(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, ""));
        assert!(!is_not_found(&err));
        assert_eq!(api_status(&err), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::new(StatusCode::FORBIDDEN, r#"{"message":"no access"}"#);
        assert_eq!(err.to_string(), "API request failed: 403 Forbidden - no access");
    }

    #[test]
    fn test_format_ibm_error_by_status() {
        let err = anyhow::Error::from(ApiError::new(StatusCode::UNAUTHORIZED, ""));
        assert!(format_ibm_error(&err).contains("Authentication failed"));

        let err = anyhow::anyhow!("connection refused");
        assert_eq!(format_ibm_error(&err), "connection refused");
    }
}
