//! Data source registry
//!
//! Static list of the data sources this provider serves, lookup by name and
//! read dispatch.

use serde::Serialize;
use serde_json::Value;

use super::diag::Diagnostic;
use super::schema::Schema;
use super::state::DataSourceState;
use super::{en_topics, schematics_agent_health};
use crate::ibm::client::ClientSession;

/// Registry entry
#[derive(Debug, Clone, Copy)]
pub struct DataSourceDef {
    pub name: &'static str,
    pub description: &'static str,
    schema: fn() -> Schema,
}

impl DataSourceDef {
    pub fn schema(&self) -> Schema {
        (self.schema)()
    }
}

/// Named schema, as printed by the `schema` command
#[derive(Debug, Clone, Serialize)]
pub struct DataSourceSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: Schema,
}

const DATA_SOURCES: &[DataSourceDef] = &[
    DataSourceDef {
        name: en_topics::NAME,
        description: "List all topics of an IBM Cloud Event Notifications instance",
        schema: en_topics::schema,
    },
    DataSourceDef {
        name: schematics_agent_health::NAME,
        description: "Most recent health-check job of an IBM Cloud Schematics agent",
        schema: schematics_agent_health::schema,
    },
];

/// All registered data sources, in declaration order
pub fn list_data_sources() -> &'static [DataSourceDef] {
    DATA_SOURCES
}

/// Look up a data source by name
pub fn get_data_source(name: &str) -> Option<&'static DataSourceDef> {
    DATA_SOURCES.iter().find(|d| d.name == name)
}

/// Named schema of one data source
pub fn describe_data_source(name: &str) -> Option<DataSourceSchema> {
    get_data_source(name).map(|def| DataSourceSchema {
        name: def.name,
        description: def.description,
        schema: def.schema(),
    })
}

/// Run the read of data source `name` with the given configuration
pub async fn read_data_source(
    name: &str,
    session: &ClientSession,
    config: &Value,
) -> Result<DataSourceState, Diagnostic> {
    tracing::debug!("read_data_source: name={}", name);

    match name {
        en_topics::NAME => en_topics::read(session, config).await,
        schematics_agent_health::NAME => schematics_agent_health::read(session, config).await,
        _ => Err(Diagnostic::invalid_config(
            format!(
                "Unknown data source: {}. Available: {}",
                name,
                DATA_SOURCES
                    .iter()
                    .map(|d| d.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            name,
        )),
    }
}
