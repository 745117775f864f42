//! Schema declarations for data sources
//!
//! A schema lists the attributes a data source accepts and produces. It is
//! static metadata: the `schema` command prints it, and reads use it to
//! validate configuration before any remote call.

use serde::Serialize;
use serde_json::{Map, Value};

use super::diag::Diagnostic;

/// Whether the user sets an attribute or the read fills it in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Required,
    Optional,
    Computed,
}

/// Attribute value type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int,
    List { elem: Box<AttributeType> },
    Object { attributes: Vec<Attribute> },
}

impl AttributeType {
    pub fn list_of(elem: AttributeType) -> Self {
        AttributeType::List {
            elem: Box::new(elem),
        }
    }

    /// Whether `value` has this type. Object members are all optional;
    /// unknown members are rejected.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => true,
            (AttributeType::Int, Value::Number(n)) => n.is_i64(),
            (AttributeType::List { elem }, Value::Array(items)) => {
                items.iter().all(|item| elem.accepts(item))
            }
            (AttributeType::Object { attributes }, Value::Object(map)) => {
                map.iter().all(|(key, value)| {
                    attributes
                        .iter()
                        .find(|a| a.name == key)
                        .is_some_and(|a| a.attr_type.accepts(value))
                })
            }
            _ => false,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Int => "integer",
            AttributeType::List { .. } => "list",
            AttributeType::Object { .. } => "object",
        }
    }
}

/// One declared attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub mode: Mode,
    pub description: &'static str,
}

impl Attribute {
    pub fn new(name: &'static str, attr_type: AttributeType, mode: Mode, description: &'static str) -> Self {
        Self {
            name,
            attr_type,
            mode,
            description,
        }
    }

    pub fn required_string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, AttributeType::String, Mode::Required, description)
    }

    pub fn optional_string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, AttributeType::String, Mode::Optional, description)
    }

    pub fn computed_string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, AttributeType::String, Mode::Computed, description)
    }

    pub fn computed_int(name: &'static str, description: &'static str) -> Self {
        Self::new(name, AttributeType::Int, Mode::Computed, description)
    }
}

/// Attribute set of a data source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check user configuration against the schema. Nulls count as unset.
    pub fn validate_config(&self, config: &Value, data_source: &str) -> Result<(), Diagnostic> {
        let Some(map) = config.as_object() else {
            return Err(Diagnostic::invalid_config(
                "configuration must be an object of attributes",
                data_source,
            ));
        };

        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            let Some(attribute) = self.attribute(key) else {
                return Err(Diagnostic::invalid_config(
                    format!("unsupported attribute \"{}\"", key),
                    data_source,
                ));
            };
            if attribute.mode == Mode::Computed {
                return Err(Diagnostic::invalid_config(
                    format!("attribute \"{}\" is computed and cannot be set", key),
                    data_source,
                ));
            }
            if !attribute.attr_type.accepts(value) {
                return Err(Diagnostic::invalid_config(
                    format!(
                        "attribute \"{}\" must be of type {}",
                        key,
                        attribute.attr_type.type_name()
                    ),
                    data_source,
                ));
            }
        }

        for attribute in self.attributes.iter().filter(|a| a.mode == Mode::Required) {
            if map.get(attribute.name).map_or(true, Value::is_null) {
                return Err(Diagnostic::invalid_config(
                    format!("missing required attribute \"{}\"", attribute.name),
                    data_source,
                ));
            }
        }

        Ok(())
    }

    /// Whether a produced attribute map only uses declared attributes with
    /// their declared types
    pub fn conforms(&self, attributes: &Map<String, Value>) -> bool {
        attributes.iter().all(|(key, value)| {
            self.attribute(key)
                .is_some_and(|a| a.attr_type.accepts(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Schema {
        Schema::new()
            .with_attribute(Attribute::required_string("instance_guid", "Instance"))
            .with_attribute(Attribute::optional_string("search_key", "Filter"))
            .with_attribute(Attribute::computed_int("total_count", "Count"))
            .with_attribute(Attribute::new(
                "items",
                AttributeType::list_of(AttributeType::Object {
                    attributes: vec![
                        Attribute::computed_string("id", "ID"),
                        Attribute::new(
                            "tags",
                            AttributeType::list_of(AttributeType::String),
                            Mode::Computed,
                            "Tags",
                        ),
                    ],
                }),
                Mode::Computed,
                "Items",
            ))
    }

    #[test]
    fn test_validate_accepts_required_and_optional() {
        let schema = sample_schema();
        assert!(schema
            .validate_config(&json!({"instance_guid": "abc", "search_key": "x"}), "ds")
            .is_ok());
        assert!(schema
            .validate_config(&json!({"instance_guid": "abc", "search_key": null}), "ds")
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_required() {
        let err = sample_schema().validate_config(&json!({}), "ds").unwrap_err();
        assert!(err.summary.contains("missing required attribute \"instance_guid\""));

        let err = sample_schema()
            .validate_config(&json!({"instance_guid": null}), "ds")
            .unwrap_err();
        assert!(err.summary.contains("instance_guid"));
    }

    #[test]
    fn test_validate_rejects_unknown_computed_and_mistyped() {
        let schema = sample_schema();

        let err = schema
            .validate_config(&json!({"instance_guid": "a", "bogus": "b"}), "ds")
            .unwrap_err();
        assert!(err.summary.contains("unsupported attribute \"bogus\""));

        let err = schema
            .validate_config(&json!({"instance_guid": "a", "total_count": 3}), "ds")
            .unwrap_err();
        assert!(err.summary.contains("computed"));

        let err = schema
            .validate_config(&json!({"instance_guid": 42}), "ds")
            .unwrap_err();
        assert!(err.summary.contains("must be of type string"));

        assert!(schema.validate_config(&json!(["not", "a", "map"]), "ds").is_err());
    }

    #[test]
    fn test_conforms_checks_nested_types() {
        let schema = sample_schema();
        let good = json!({
            "instance_guid": "a",
            "total_count": 1,
            "items": [{"id": "1", "tags": ["x", "y"]}, {}]
        });
        assert!(schema.conforms(good.as_object().unwrap()));

        let bad = json!({"items": [{"id": 1}]});
        assert!(!schema.conforms(bad.as_object().unwrap()));

        let unknown = json!({"items": [{"other": "x"}]});
        assert!(!schema.conforms(unknown.as_object().unwrap()));
    }

    #[test]
    fn test_schema_serializes_types() {
        let value = serde_json::to_value(sample_schema()).unwrap();
        assert_eq!(value["attributes"][0]["type"]["kind"], "string");
        assert_eq!(value["attributes"][0]["mode"], "required");
        assert_eq!(value["attributes"][3]["type"]["elem"]["kind"], "object");
    }
}
