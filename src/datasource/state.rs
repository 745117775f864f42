//! Data source state
//!
//! The result of a read: a local identifier plus the flat attribute map the
//! caller persists.

use serde::Serialize;
use serde_json::{Map, Value};

use super::diag::{Diagnostic, ErrorKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSourceState {
    pub id: String,
    pub attributes: Map<String, Value>,
}

impl DataSourceState {
    /// Serialize typed attributes into the flat map. `None` fields must be
    /// declared with `skip_serializing_if` so they are omitted, not nulled.
    pub fn from_attributes<T: Serialize>(
        id: String,
        attributes: &T,
        data_source: &str,
        operation: &str,
    ) -> Result<Self, Diagnostic> {
        let value = serde_json::to_value(attributes).map_err(|e| {
            let err = anyhow::Error::from(e);
            Diagnostic::error(
                ErrorKind::StateAssignment,
                &err,
                format!("Error setting state: {}", err),
                data_source,
                operation,
            )
        })?;

        let Value::Object(attributes) = value else {
            let err = anyhow::anyhow!("attributes did not serialize to a map");
            return Err(Diagnostic::error(
                ErrorKind::StateAssignment,
                &err,
                format!("Error setting state: {}", err),
                data_source,
                operation,
            ));
        };

        Ok(Self { id, attributes })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Sample {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    #[test]
    fn test_unset_fields_are_omitted() {
        let state = DataSourceState::from_attributes(
            "id-1".to_string(),
            &Sample {
                name: "a".to_string(),
                note: None,
            },
            "ds",
            "read",
        )
        .unwrap();

        assert_eq!(state.id, "id-1");
        assert_eq!(state.get("name"), Some(&json!("a")));
        assert!(!state.attributes.contains_key("note"));
    }

    #[test]
    fn test_non_map_attributes_fail_assignment() {
        let err = DataSourceState::from_attributes("id".to_string(), &vec![1, 2], "ds", "read")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::StateAssignment);
    }
}
