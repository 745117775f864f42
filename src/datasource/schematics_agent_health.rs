//! `ibm_schematics_agent_health` - latest health-check job of a Schematics agent

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::diag::{Diagnostic, ErrorKind};
use super::schema::{Attribute, Schema};
use super::state::DataSourceState;
use crate::ibm::auth::is_auth_failure;
use crate::ibm::client::ClientSession;
use crate::ibm::http::is_not_found;
use crate::ibm::schematics::{get_agent_data, AgentData, GetAgentDataOptions, PROFILE_DETAILED};

pub const NAME: &str = "ibm_schematics_agent_health";

const OPERATION: &str = "read";

pub fn schema() -> Schema {
    Schema::new()
        .with_attribute(Attribute::required_string(
            "agent_id",
            "Agent ID to get the details of agent.",
        ))
        .with_attribute(Attribute::computed_string("job_id", "Job Id."))
        .with_attribute(Attribute::computed_string(
            "updated_at",
            "The agent health check job updation time.",
        ))
        .with_attribute(Attribute::computed_string(
            "updated_by",
            "Email address of user who ran the agent health check job.",
        ))
        .with_attribute(Attribute::computed_string("agent_version", "Agent version."))
        .with_attribute(Attribute::computed_string(
            "status_code",
            "Final result of the health-check job.",
        ))
        .with_attribute(Attribute::computed_string(
            "status_message",
            "The outcome of the health-check job, in a formatted log string.",
        ))
        .with_attribute(Attribute::computed_string(
            "log_url",
            "URL to the full health-check job logs.",
        ))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentHealthConfig {
    pub agent_id: String,
}

impl AgentHealthConfig {
    pub fn from_config(config: &Value) -> Result<Self, Diagnostic> {
        schema().validate_config(config, NAME)?;
        serde_json::from_value(config.clone()).map_err(|e| Diagnostic::invalid_config(e.to_string(), NAME))
    }

    pub fn agent_data_options(&self) -> GetAgentDataOptions {
        GetAgentDataOptions::new(&self.agent_id).with_profile(PROFILE_DETAILED)
    }
}

/// Output attributes; every health field is omitted when unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentHealthAttributes {
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,
}

impl AgentHealthAttributes {
    /// Attributes for an agent with no health record
    pub fn empty(agent_id: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            ..Default::default()
        }
    }

    /// Copy the recent health job. Without one, only `agent_id` is set.
    pub fn from_agent_data(agent_id: &str, agent: &AgentData) -> Self {
        let Some(job) = &agent.recent_health_job else {
            return Self::empty(agent_id);
        };

        Self {
            agent_id: agent_id.to_string(),
            job_id: job.job_id.clone(),
            updated_at: job.updated_at.as_ref().map(format_timestamp),
            updated_by: job.updated_by.clone(),
            agent_version: agent.version.clone(),
            status_code: job.status_code.clone(),
            status_message: job.status_message.clone(),
            log_url: job.log_url.clone(),
        }
    }

    /// Job id when known, otherwise the agent id
    pub fn state_id(&self) -> String {
        self.job_id.clone().unwrap_or_else(|| self.agent_id.clone())
    }
}

/// RFC 3339, millisecond precision, `Z` suffix
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read the most recent health-check job of the configured agent
pub async fn read(session: &ClientSession, config: &Value) -> Result<DataSourceState, Diagnostic> {
    let config = AgentHealthConfig::from_config(config)?;

    let client = session.schematics_api().map_err(|e| {
        Diagnostic::error(ErrorKind::ClientSession, &e, e.to_string(), NAME, OPERATION)
    })?;

    let options = config.agent_data_options();
    tracing::info!("Reading health of agent {}", config.agent_id);

    let attributes = match get_agent_data(&client, &options).await {
        Ok(agent) => AgentHealthAttributes::from_agent_data(&config.agent_id, &agent),
        Err(e) if is_not_found(&e) && !is_auth_failure(&e) => {
            tracing::warn!("Agent {} not found, returning empty health record", config.agent_id);
            AgentHealthAttributes::empty(&config.agent_id)
        }
        Err(e) => {
            return Err(Diagnostic::error(
                ErrorKind::for_remote_error(&e),
                &e,
                format!("get_agent_data failed: {:#}", e),
                NAME,
                OPERATION,
            ));
        }
    };

    DataSourceState::from_attributes(attributes.state_id(), &attributes, NAME, OPERATION)
}
