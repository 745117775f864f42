//! IBM Cloud API interaction module
//!
//! This module provides the core functionality for talking to IBM Cloud
//! services: IAM authentication, the HTTP client, the client session and
//! the two service APIs the data sources read from.
//!
//! # Module Structure
//!
//! - [`auth`] - API key to IAM token exchange with token caching
//! - [`client`] - Client session and per-service clients
//! - [`http`] - HTTP utilities and the typed [`http::ApiError`]
//! - [`event_notifications`] - Event Notifications topic listing
//! - [`schematics`] - Schematics agent lookup
//!
//! # Example
//!
//! ```ignore
//! use crate::ibm::client::{ClientSession, SessionConfig};
//! use crate::ibm::event_notifications::{list_topics, ListTopicsOptions};
//!
//! async fn example(config: SessionConfig) -> anyhow::Result<()> {
//!     let session = ClientSession::new(config)?;
//!     let client = session.event_notifications_api()?;
//!     let page = list_topics(&client, &ListTopicsOptions::new("instance-guid")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod event_notifications;
pub mod http;
pub mod schematics;
