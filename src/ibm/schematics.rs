//! Schematics API
//!
//! Agent lookup, including the most recent health-check job.

use super::client::ServiceClient;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Profile that includes the recent job summaries in the agent payload
pub const PROFILE_DETAILED: &str = "detailed";

/// Options for `GET /v2/agents/{agent_id}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetAgentDataOptions {
    pub agent_id: String,
    pub profile: Option<String>,
}

impl GetAgentDataOptions {
    pub fn new(agent_id: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: &str) -> Self {
        self.profile = Some(profile.to_string());
        self
    }
}

/// Agent record; only the fields the data sources read are decoded
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub recent_health_job: Option<AgentDataRecentHealthJob>,
}

/// Summary of the last health-check job run against an agent
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AgentDataRecentHealthJob {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub log_url: Option<String>,
}

/// Fetch an agent. A missing agent surfaces as an [`super::http::ApiError`]
/// with status 404 inside the returned error.
pub async fn get_agent_data(client: &ServiceClient, options: &GetAgentDataOptions) -> Result<AgentData> {
    let mut url = client.url(&["v2", "agents", &options.agent_id]);
    if let Some(profile) = &options.profile {
        url.query_pairs_mut().append_pair("profile", profile);
    }

    let response = client.get(&url).await?;
    serde_json::from_value(response).context("Failed to decode agent data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_decode_agent_with_health_job() {
        let agent: AgentData = serde_json::from_value(json!({
            "id": "agent-1",
            "name": "prod-agent",
            "version": "1.2.0",
            "recent_health_job": {
                "job_id": "job-9",
                "updated_at": "2024-03-01T10:20:30.123Z",
                "updated_by": "ops@example.com",
                "status_code": "job_finished",
                "status_message": "Health check passed",
                "log_url": "https://logs.example.com/job-9"
            }
        }))
        .unwrap();

        let job = agent.recent_health_job.unwrap();
        assert_eq!(job.job_id.as_deref(), Some("job-9"));
        assert_eq!(
            job.updated_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap() + chrono::Duration::milliseconds(123))
        );
        assert_eq!(agent.version.as_deref(), Some("1.2.0"));
    }

    #[test]
    fn test_decode_agent_without_health_job() {
        let agent: AgentData = serde_json::from_value(json!({"id": "agent-1"})).unwrap();
        assert!(agent.recent_health_job.is_none());
        assert!(agent.version.is_none());
    }
}
