//! Data source layer
//!
//! Each data source validates its configuration against a static schema,
//! builds request options, calls the IBM Cloud API and flattens the response
//! into a [`DataSourceState`].
//!
//! # Architecture
//!
//! - [`registry`] - Name lookup and read dispatch
//! - [`schema`] - Attribute declarations and config validation
//! - [`fetcher`] - Offset pagination shared by list reads
//! - [`state`] - Flat attribute map produced by a read
//! - [`diag`] - Diagnostics returned when a read fails
//! - [`en_topics`] - `ibm_en_topics`
//! - [`schematics_agent_health`] - `ibm_schematics_agent_health`
//!
//! # Example
//!
//! ```ignore
//! use crate::datasource::read_data_source;
//!
//! async fn topics(session: &ClientSession) -> Result<DataSourceState, Diagnostic> {
//!     let config = serde_json::json!({"instance_guid": "f3b1..."});
//!     read_data_source("ibm_en_topics", session, &config).await
//! }
//! ```

pub mod diag;
pub mod en_topics;
pub mod fetcher;
mod registry;
pub mod schema;
pub mod schematics_agent_health;
pub mod state;

pub use diag::{Diagnostic, ErrorKind};
pub use registry::*;
pub use state::DataSourceState;
