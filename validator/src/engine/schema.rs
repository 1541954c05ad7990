//! Table Schema descriptors as understood by the bundled engine.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::cast::{cast, CellValue};
use crate::error::{EngineError, EngineResult};

/// Field types supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Date,
    Datetime,
    Time,
    Year,
    Any,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Time => "time",
            FieldType::Year => "year",
            FieldType::Any => "any",
        }
    }
}

/// Field constraints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub minimum: Option<Value>,
    pub maximum: Option<Value>,
    pub pattern: Option<String>,
    #[serde(rename = "enum")]
    pub enumeration: Option<Vec<Value>>,
}

/// One declared field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default = "default_true_values")]
    pub true_values: Vec<String>,
    #[serde(default = "default_false_values")]
    pub false_values: Vec<String>,
}

impl FieldSchema {
    /// `type/format` label used in error notes.
    pub fn type_label(&self) -> String {
        format!("{}/{}", self.field_type.as_str(), self.format)
    }
}

/// A resource's table schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default = "default_missing_values")]
    pub missing_values: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub primary_key: Vec<String>,
}

fn default_format() -> String {
    "default".to_string()
}

fn default_missing_values() -> Vec<String> {
    vec![String::new()]
}

fn default_true_values() -> Vec<String> {
    ["true", "True", "TRUE", "1"].iter().map(|s| s.to_string()).collect()
}

fn default_false_values() -> Vec<String> {
    ["false", "False", "FALSE", "0"].iter().map(|s| s.to_string()).collect()
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(key) => vec![key],
        OneOrMany::Many(keys) => keys,
    })
}

// =============================================================================
// Compiled schema
// =============================================================================

/// A field with its constraints parsed into comparable values.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub schema: FieldSchema,
    pub pattern: Option<Regex>,
    pub enumeration: Option<Vec<CellValue>>,
    pub minimum: Option<CellValue>,
    pub maximum: Option<CellValue>,
}

impl CompiledField {
    pub fn name(&self) -> &str {
        &self.schema.name
    }
}

/// Schema ready for row checks.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub fields: Vec<CompiledField>,
    pub missing_values: Vec<String>,
    /// Positions of the primary key fields
    pub primary_key: Vec<usize>,
}

impl CompiledSchema {
    /// Interpret the raw `schema` object of a resource.
    pub fn compile(resource: &str, schema: &Value) -> EngineResult<Self> {
        let table: TableSchema =
            serde_json::from_value(schema.clone()).map_err(|e| EngineError::InvalidSchema {
                resource: resource.to_string(),
                message: e.to_string(),
            })?;

        let fields = table
            .fields
            .into_iter()
            .map(|field| compile_field(resource, field))
            .collect::<EngineResult<Vec<_>>>()?;

        let primary_key = table
            .primary_key
            .iter()
            .map(|key| {
                fields
                    .iter()
                    .position(|field| field.name() == key)
                    .ok_or_else(|| EngineError::InvalidSchema {
                        resource: resource.to_string(),
                        message: format!("primary key field '{}' is not declared", key),
                    })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Self {
            fields,
            missing_values: table.missing_values,
            primary_key,
        })
    }

    pub fn is_missing(&self, cell: &str) -> bool {
        self.missing_values.iter().any(|missing| missing == cell)
    }
}

fn compile_field(resource: &str, field: FieldSchema) -> EngineResult<CompiledField> {
    let pattern = field
        .constraints
        .pattern
        .as_deref()
        .map(|pattern| {
            // constraints match the whole cell
            Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| EngineError::InvalidPattern {
                resource: resource.to_string(),
                field: field.name.clone(),
                message: e.to_string(),
            })
        })
        .transpose()?;

    let constraint_value = |constraint: &'static str, value: &Value| -> EngineResult<CellValue> {
        let raw = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        cast(&field, &raw).ok_or_else(|| EngineError::InvalidConstraint {
            resource: resource.to_string(),
            field: field.name.clone(),
            constraint,
            value: raw,
            field_type: field.field_type.as_str(),
        })
    };

    let enumeration = field
        .constraints
        .enumeration
        .as_ref()
        .map(|values| {
            values
                .iter()
                .map(|value| constraint_value("enum", value))
                .collect::<EngineResult<Vec<_>>>()
        })
        .transpose()?;
    let minimum = field
        .constraints
        .minimum
        .as_ref()
        .map(|value| constraint_value("minimum", value))
        .transpose()?;
    let maximum = field
        .constraints
        .maximum
        .as_ref()
        .map(|value| constraint_value("maximum", value))
        .transpose()?;

    Ok(CompiledField {
        schema: field,
        pattern,
        enumeration,
        minimum,
        maximum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let schema = CompiledSchema::compile(
            "screening_data",
            &json!({ "fields": [ { "name": "PATIENT_MR_ID_VALUE" } ] }),
        )
        .unwrap();

        let field = &schema.fields[0];
        assert_eq!(field.schema.field_type, FieldType::String);
        assert_eq!(field.schema.type_label(), "string/default");
        assert!(!field.schema.constraints.required);
        assert!(schema.is_missing(""));
        assert!(schema.primary_key.is_empty());
    }

    #[test]
    fn test_enum_values_cast_to_field_type() {
        let schema = CompiledSchema::compile(
            "qe_admin_data",
            &json!({ "fields": [
                { "name": "SCORE", "type": "integer", "constraints": { "enum": [1, "2"] } }
            ] }),
        )
        .unwrap();

        assert_eq!(
            schema.fields[0].enumeration,
            Some(vec![CellValue::Integer(1), CellValue::Integer(2)])
        );
    }

    #[test]
    fn test_enum_value_of_wrong_type_rejected() {
        let err = CompiledSchema::compile(
            "qe_admin_data",
            &json!({ "fields": [
                { "name": "SCORE", "type": "integer", "constraints": { "enum": ["high"] } }
            ] }),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConstraint { constraint: "enum", .. }));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = CompiledSchema::compile(
            "qe_admin_data",
            &json!({ "fields": [ { "name": "LOCATION", "type": "geopoint" } ] }),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSchema { .. }));
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let err = CompiledSchema::compile(
            "qe_admin_data",
            &json!({ "fields": [ { "name": "ID", "constraints": { "pattern": "([a-z" } } ] }),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPattern { .. }));
    }

    #[test]
    fn test_primary_key_string_or_list() {
        let single = CompiledSchema::compile(
            "x",
            &json!({ "fields": [ { "name": "A" }, { "name": "B" } ], "primaryKey": "B" }),
        )
        .unwrap();
        assert_eq!(single.primary_key, vec![1]);

        let composite = CompiledSchema::compile(
            "x",
            &json!({ "fields": [ { "name": "A" }, { "name": "B" } ], "primaryKey": ["A", "B"] }),
        )
        .unwrap();
        assert_eq!(composite.primary_key, vec![0, 1]);

        assert!(CompiledSchema::compile(
            "x",
            &json!({ "fields": [ { "name": "A" } ], "primaryKey": "Z" }),
        )
        .is_err());
    }
}
