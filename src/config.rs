//! Configuration Management
//!
//! Persistent defaults for ibm-datasource, and resolution of the session
//! configuration from flags, environment and the config file.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ibm::client::{SessionConfig, DEFAULT_REGION};

const API_KEY_VARS: &[&str] = &["IC_API_KEY", "IBMCLOUD_API_KEY"];
const IAM_TOKEN_VARS: &[&str] = &["IC_IAM_TOKEN", "IBMCLOUD_IAM_TOKEN"];
const REGION_VARS: &[&str] = &["IC_REGION", "IBMCLOUD_REGION"];
const IAM_ENDPOINT_VARS: &[&str] = &["IBMCLOUD_IAM_API_ENDPOINT"];
const EVENT_NOTIFICATIONS_ENDPOINT_VARS: &[&str] = &["IBMCLOUD_EVENT_NOTIFICATIONS_API_ENDPOINT"];
const SCHEMATICS_ENDPOINT_VARS: &[&str] = &["IBMCLOUD_SCHEMATICS_API_ENDPOINT"];

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default region
    #[serde(default)]
    pub region: Option<String>,
    /// IAM endpoint override
    #[serde(default)]
    pub iam_endpoint: Option<String>,
    /// Event Notifications endpoint override
    #[serde(default)]
    pub event_notifications_endpoint: Option<String>,
    /// Schematics endpoint override
    #[serde(default)]
    pub schematics_endpoint: Option<String>,
}

/// Values given on the command line; they win over everything else
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ibm-datasource").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Merge non-empty values from `other` into this config
    pub fn merge(&mut self, other: Config) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                *slot = Some(v);
            }
        }
        take(&mut self.region, other.region);
        take(&mut self.iam_endpoint, other.iam_endpoint);
        take(&mut self.event_notifications_endpoint, other.event_notifications_endpoint);
        take(&mut self.schematics_endpoint, other.schematics_endpoint);
    }

    /// Resolve the session configuration from the process environment
    pub fn session_config(&self, overrides: &Overrides) -> SessionConfig {
        self.session_config_with_env(overrides, |name| std::env::var(name).ok())
    }

    /// Resolve the session configuration (CLI > environment > config file > default)
    pub fn session_config_with_env<E>(&self, overrides: &Overrides, env: E) -> SessionConfig
    where
        E: Fn(&str) -> Option<String>,
    {
        let first_env = |names: &[&str]| {
            names
                .iter()
                .filter_map(|&name| env(name))
                .find(|v| !v.trim().is_empty())
        };

        let region = overrides
            .region
            .clone()
            .or_else(|| first_env(REGION_VARS))
            .or_else(|| self.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        SessionConfig {
            api_key: first_env(API_KEY_VARS),
            iam_token: first_env(IAM_TOKEN_VARS),
            region,
            iam_endpoint: first_env(IAM_ENDPOINT_VARS).or_else(|| self.iam_endpoint.clone()),
            event_notifications_endpoint: first_env(EVENT_NOTIFICATIONS_ENDPOINT_VARS)
                .or_else(|| self.event_notifications_endpoint.clone()),
            schematics_endpoint: first_env(SCHEMATICS_ENDPOINT_VARS)
                .or_else(|| self.schematics_endpoint.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_anything() {
        let session = Config::default().session_config_with_env(&Overrides::default(), env_from(&[]));
        assert_eq!(session.region, DEFAULT_REGION);
        assert!(session.api_key.is_none());
        assert!(session.iam_token.is_none());
        assert!(session.schematics_endpoint.is_none());
    }

    #[test]
    fn test_region_precedence() {
        let config = Config {
            region: Some("jp-tok".to_string()),
            ..Default::default()
        };

        let from_file = config.session_config_with_env(&Overrides::default(), env_from(&[]));
        assert_eq!(from_file.region, "jp-tok");

        let from_env =
            config.session_config_with_env(&Overrides::default(), env_from(&[("IBMCLOUD_REGION", "eu-gb")]));
        assert_eq!(from_env.region, "eu-gb");

        let overrides = Overrides {
            region: Some("au-syd".to_string()),
        };
        let from_flag = config.session_config_with_env(&overrides, env_from(&[("IC_REGION", "eu-gb")]));
        assert_eq!(from_flag.region, "au-syd");
    }

    #[test]
    fn test_api_key_env_order_and_empty_values() {
        let session = Config::default().session_config_with_env(
            &Overrides::default(),
            env_from(&[("IC_API_KEY", " "), ("IBMCLOUD_API_KEY", "key-2")]),
        );
        assert_eq!(session.api_key.as_deref(), Some("key-2"));
    }

    #[test]
    fn test_endpoint_env_beats_config_file() {
        let config = Config {
            schematics_endpoint: Some("https://file.example".to_string()),
            event_notifications_endpoint: Some("https://en.file.example".to_string()),
            ..Default::default()
        };
        let session = config.session_config_with_env(
            &Overrides::default(),
            env_from(&[("IBMCLOUD_SCHEMATICS_API_ENDPOINT", "https://env.example")]),
        );
        assert_eq!(session.schematics_endpoint.as_deref(), Some("https://env.example"));
        assert_eq!(
            session.event_notifications_endpoint.as_deref(),
            Some("https://en.file.example")
        );
    }

    #[test]
    fn test_merge_ignores_empty_values() {
        let mut config = Config {
            region: Some("us-east".to_string()),
            ..Default::default()
        };
        config.merge(Config {
            region: Some("".to_string()),
            iam_endpoint: Some("https://iam.test".to_string()),
            ..Default::default()
        });
        assert_eq!(config.region.as_deref(), Some("us-east"));
        assert_eq!(config.iam_endpoint.as_deref(), Some("https://iam.test"));
    }

    #[test]
    fn test_config_roundtrips_partial_json() {
        let config: Config = serde_json::from_str(r#"{"region":"ca-tor"}"#).unwrap();
        assert_eq!(config.region.as_deref(), Some("ca-tor"));
        assert!(config.iam_endpoint.is_none());
    }
}
