//! Event Notifications API
//!
//! Topic listing for an Event Notifications instance.

use super::client::ServiceClient;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Options for `GET /v1/instances/{instance_id}/topics`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListTopicsOptions {
    pub instance_id: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
}

impl ListTopicsOptions {
    pub fn new(instance_id: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// One page of topics
#[derive(Debug, Clone, Deserialize)]
pub struct TopicList {
    #[serde(default)]
    pub total_count: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub topics: Vec<TopicsListItem>,
}

/// Topic summary as returned by the list operation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TopicsListItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_count: Option<i64>,
    #[serde(default)]
    pub sources_names: Option<Vec<String>>,
    #[serde(default)]
    pub subscription_count: Option<i64>,
}

/// List one page of topics
pub async fn list_topics(client: &ServiceClient, options: &ListTopicsOptions) -> Result<TopicList> {
    let mut url = client.url(&["v1", "instances", &options.instance_id, "topics"]);
    {
        let mut query = url.query_pairs_mut();
        if let Some(limit) = options.limit {
            query.append_pair("limit", &limit.to_string());
        }
        if let Some(offset) = options.offset {
            query.append_pair("offset", &offset.to_string());
        }
        if let Some(search) = &options.search {
            query.append_pair("search", search);
        }
    }
    // An empty serializer still leaves a trailing '?'
    if url.query() == Some("") {
        url.set_query(None);
    }

    let response = client.get(&url).await?;
    serde_json::from_value(response).context("Failed to decode topic list")
}
