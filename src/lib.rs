//! Read-only IBM Cloud data sources
//!
//! Reads Event Notifications topics and Schematics agent health from IBM
//! Cloud and flattens the responses into a flat attribute map.
//!
//! - [`ibm`] - IAM authentication, HTTP client and service APIs
//! - [`datasource`] - Schemas, reads, pagination and state flattening
//! - [`config`] - Persisted defaults and session configuration

pub mod config;
pub mod datasource;
pub mod ibm;
