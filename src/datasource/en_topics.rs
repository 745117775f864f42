//! `ibm_en_topics` - all topics of an Event Notifications instance

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::diag::{Diagnostic, ErrorKind};
use super::fetcher::{fetch_all_pages, Page, MAX_PAGES, PAGE_SIZE};
use super::schema::{Attribute, AttributeType, Mode, Schema};
use super::state::DataSourceState;
use crate::ibm::client::ClientSession;
use crate::ibm::event_notifications::{list_topics, ListTopicsOptions, TopicsListItem};

pub const NAME: &str = "ibm_en_topics";

const OPERATION: &str = "list";

pub fn schema() -> Schema {
    Schema::new()
        .with_attribute(Attribute::required_string(
            "instance_guid",
            "Unique identifier for IBM Cloud Event Notifications instance.",
        ))
        .with_attribute(Attribute::computed_int("total_count", "Number of topics."))
        .with_attribute(Attribute::optional_string("search_key", "Filter the topic by name"))
        .with_attribute(Attribute::new(
            "topics",
            AttributeType::list_of(AttributeType::Object {
                attributes: vec![
                    Attribute::computed_string("id", "Autogenerated topic ID."),
                    Attribute::computed_string("name", "Name of the topic."),
                    Attribute::computed_string("description", "Description of the topic."),
                    Attribute::computed_int("source_count", "Number of sources."),
                    Attribute::new(
                        "sources_names",
                        AttributeType::list_of(AttributeType::String),
                        Mode::Computed,
                        "List of source names.",
                    ),
                    Attribute::computed_int("subscription_count", "Number of subscriptions."),
                ],
            }),
            Mode::Computed,
            "List of topics.",
        ))
}

/// User-supplied attributes
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnTopicsConfig {
    pub instance_guid: String,
    #[serde(default)]
    pub search_key: Option<String>,
}

impl EnTopicsConfig {
    /// Validate against the schema and decode
    pub fn from_config(config: &Value) -> Result<Self, Diagnostic> {
        schema().validate_config(config, NAME)?;
        let mut parsed: Self = serde_json::from_value(config.clone())
            .map_err(|e| Diagnostic::invalid_config(e.to_string(), NAME))?;
        // An empty filter is the same as no filter
        if parsed.search_key.as_deref() == Some("") {
            parsed.search_key = None;
        }
        Ok(parsed)
    }

    pub fn list_options(&self) -> ListTopicsOptions {
        let options = ListTopicsOptions::new(&self.instance_guid).with_limit(PAGE_SIZE);
        match &self.search_key {
            Some(search) => options.with_search(search),
            None => options,
        }
    }
}

/// Output attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnTopicsAttributes {
    pub instance_guid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_key: Option<String>,
    pub total_count: i64,
    pub topics: Vec<TopicAttributes>,
}

/// One flattened topic
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopicAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_count: Option<i64>,
}

impl From<&TopicsListItem> for TopicAttributes {
    fn from(item: &TopicsListItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            source_count: item.source_count,
            sources_names: item.sources_names.clone(),
            subscription_count: item.subscription_count,
        }
    }
}

/// Flatten topics, preserving order
pub fn flatten_topics(items: &[TopicsListItem]) -> Vec<TopicAttributes> {
    items.iter().map(TopicAttributes::from).collect()
}

/// Local identifier for a topics read
pub fn state_id(instance_guid: &str) -> String {
    format!("topics_{}", instance_guid)
}

/// Read every topic of the configured instance
pub async fn read(session: &ClientSession, config: &Value) -> Result<DataSourceState, Diagnostic> {
    let config = EnTopicsConfig::from_config(config)?;

    let client = session.event_notifications_api().map_err(|e| {
        Diagnostic::error(ErrorKind::ClientSession, &e, e.to_string(), NAME, OPERATION)
    })?;

    let options = config.list_options();
    tracing::info!(
        "Reading topics of instance {} (search: {:?})",
        config.instance_guid,
        config.search_key
    );

    let client = &client;
    let base_options = &options;
    let aggregated = fetch_all_pages(PAGE_SIZE, MAX_PAGES, move |offset, limit| {
        let options = base_options.clone().with_limit(limit).with_offset(offset);
        async move {
            let list = list_topics(client, &options).await?;
            let total_count = list
                .total_count
                .ok_or_else(|| anyhow::anyhow!("Topic list response has no total_count"))?;
            Ok::<_, anyhow::Error>(Page {
                items: list.topics,
                total_count,
            })
        }
    })
    .await
    .map_err(|e| {
        Diagnostic::error(
            ErrorKind::for_remote_error(&e),
            &e,
            format!("list_topics failed: {:#}", e),
            NAME,
            OPERATION,
        )
    })?;

    tracing::info!(
        "Read {} topics in {} pages (total_count {})",
        aggregated.items.len(),
        aggregated.pages,
        aggregated.total_count
    );

    let attributes = EnTopicsAttributes {
        instance_guid: config.instance_guid.clone(),
        search_key: config.search_key.clone(),
        total_count: aggregated.total_count,
        topics: flatten_topics(&aggregated.items),
    };

    DataSourceState::from_attributes(state_id(&config.instance_guid), &attributes, NAME, OPERATION)
}
