//! Diagnostics returned to the caller when a read fails

use serde::Serialize;
use std::fmt;

use crate::ibm::auth::is_auth_failure;
use crate::ibm::http::format_ibm_error;

/// What went wrong, coarsely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input attributes do not match the data source schema
    InvalidConfig,
    /// Credentials or a service client could not be obtained
    ClientSession,
    /// The remote call failed (anything but the tolerated not-found)
    RemoteCall,
    /// The output attribute map could not be produced
    StateAssignment,
}

impl ErrorKind {
    /// Kind for an error returned by a service call: credential problems
    /// belong to the session, everything else to the call
    pub fn for_remote_error(error: &anyhow::Error) -> Self {
        if is_auth_failure(error) {
            ErrorKind::ClientSession
        } else {
            ErrorKind::RemoteCall
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidConfig => "invalid configuration",
            ErrorKind::ClientSession => "client session",
            ErrorKind::RemoteCall => "remote call",
            ErrorKind::StateAssignment => "state assignment",
        };
        f.write_str(s)
    }
}

/// Terminal error for a data source read, labelled with the data source
/// and the operation that failed
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{resource} {operation}: {summary}")]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub summary: String,
    pub detail: String,
    pub resource: String,
    pub operation: String,
}

impl Diagnostic {
    /// Wrap `error` with a summary line. `data_source` is the registry name,
    /// e.g. `ibm_en_topics`.
    pub fn error(
        kind: ErrorKind,
        error: &anyhow::Error,
        summary: impl Into<String>,
        data_source: &str,
        operation: &str,
    ) -> Self {
        let diag = Self {
            kind,
            summary: summary.into(),
            detail: format_ibm_error(error),
            resource: format!("(Data) {}", data_source),
            operation: operation.to_string(),
        };
        tracing::debug!("{} [{}]: {:#}", diag, kind, error);
        diag
    }

    /// Configuration problem found before any remote call
    pub fn invalid_config(message: impl Into<String>, data_source: &str) -> Self {
        let summary = message.into();
        Self {
            kind: ErrorKind::InvalidConfig,
            detail: summary.clone(),
            summary,
            resource: format!("(Data) {}", data_source),
            operation: "validate".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_labels_resource_and_operation() {
        let err = anyhow::anyhow!("boom");
        let diag = Diagnostic::error(
            ErrorKind::RemoteCall,
            &err,
            format!("list_topics failed: {}", err),
            "ibm_en_topics",
            "list",
        );

        assert_eq!(diag.resource, "(Data) ibm_en_topics");
        assert_eq!(diag.to_string(), "(Data) ibm_en_topics list: list_topics failed: boom");
        assert_eq!(diag.detail, "boom");
    }

    #[test]
    fn test_kind_for_remote_error() {
        use crate::ibm::auth::TokenUnavailable;

        let auth = anyhow::anyhow!("bad key").context(TokenUnavailable);
        assert_eq!(ErrorKind::for_remote_error(&auth), ErrorKind::ClientSession);
        assert_eq!(
            ErrorKind::for_remote_error(&anyhow::anyhow!("timeout")),
            ErrorKind::RemoteCall
        );
    }

    #[test]
    fn test_invalid_config() {
        let diag = Diagnostic::invalid_config("missing required attribute \"agent_id\"", "x");
        assert_eq!(diag.kind, ErrorKind::InvalidConfig);
        assert_eq!(diag.operation, "validate");
    }

    #[test]
    fn test_serializes_kind_snake_case() {
        let diag = Diagnostic::invalid_config("bad", "x");
        let value = serde_json::to_value(&diag).unwrap();
        assert_eq!(value["kind"], "invalid_config");
        assert_eq!(value["resource"], "(Data) x");
    }
}
