//! Specification loading.
//!
//! The specification file is checked against an embedded JSON Schema
//! (Draft 7) before it is deserialized, so a malformed document fails with
//! every violation listed instead of the first serde error.
//!
//! # Embedded Schema
//!
//! `schemas/specification.json` is embedded at compile time. It only pins down
//! the descriptor shape (`resources[].name`, `resources[].schema.fields[].name`);
//! field types and constraints are left to the validation engine.

use serde_json::Value;
use std::path::Path;

use crate::error::SpecificationError;
use crate::models::Specification;

const SPECIFICATION_SCHEMA: &str = include_str!("../../schemas/specification.json");

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid descriptor schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check a parsed document against the embedded specification schema.
pub fn check_descriptor(document: &Value) -> Result<(), Vec<String>> {
    let schema: Value = serde_json::from_str(SPECIFICATION_SCHEMA)
        .map_err(|e| vec![format!("Invalid embedded schema: {}", e)])?;
    validate(&schema, document)
}

/// Parse and check specification text.
pub fn parse_specification(content: &str) -> Result<Specification, SpecificationError> {
    let document: Value = serde_json::from_str(content)?;
    check_descriptor(&document).map_err(|errors| SpecificationError::Invalid { errors })?;
    Ok(serde_json::from_value(document)?)
}

/// Read, parse and check the specification file.
pub fn load_specification(path: &Path) -> Result<Specification, SpecificationError> {
    let content = std::fs::read_to_string(path).map_err(|source| SpecificationError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let specification = parse_specification(&content)?;

    tracing::debug!(
        path = %path.display(),
        resources = specification.resources.len(),
        "loaded specification"
    );
    Ok(specification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "resources": [
                {
                    "name": "qe_admin_data",
                    "schema": { "fields": [ { "name": "ORGANIZATION_TYPE", "type": "string" } ] }
                },
                {
                    "name": "screening_data",
                    "schema": { "fields": [ { "name": "SCREENING_STATUS_CODE" } ] }
                }
            ]
        })
    }

    #[test]
    fn test_valid_specification() {
        let spec = parse_specification(&sample().to_string()).unwrap();
        assert_eq!(spec.resources.len(), 2);
        assert_eq!(spec.resources[0].name, "qe_admin_data");
        assert!(spec.resource("screening_data").is_some());
    }

    #[test]
    fn test_unknown_resource_names_are_accepted() {
        let doc = json!({
            "resources": [ { "name": "encounter_data", "schema": { "fields": [] } } ]
        });
        let spec = parse_specification(&doc.to_string()).unwrap();
        assert_eq!(spec.resources[0].name, "encounter_data");
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_specification("{ \"resources\": [").unwrap_err();
        assert!(matches!(err, SpecificationError::Json(_)));
    }

    #[test]
    fn test_missing_resources_key() {
        let err = parse_specification("{}").unwrap_err();
        match err {
            SpecificationError::Invalid { errors } => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("resources"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_all_violations_reported() {
        let doc = json!({
            "resources": [
                { "name": "qe_admin_data" },
                { "schema": { "fields": [] } }
            ]
        });
        match check_descriptor(&doc) {
            Err(errors) => assert_eq!(errors.len(), 2),
            Ok(()) => panic!("descriptor should be rejected"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_specification(Path::new("/definitely/not/here/spec.json")).unwrap_err();
        assert!(matches!(err, SpecificationError::Io { .. }));
    }
}
