//! Header, row and cell checks for one resource.

use std::collections::HashMap;
use std::time::Instant;

use super::cast::{cast, CellValue};
use super::report::{round_seconds, ErrorKind, TaskError, TaskReport, TaskStats};
use super::schema::{CompiledField, CompiledSchema};
use crate::error::EngineResult;
use crate::normalize::NormalizedResource;

/// Collects findings up to a limit.
struct Findings {
    errors: Vec<TaskError>,
    warnings: Vec<String>,
    limit: usize,
}

impl Findings {
    fn new(limit: usize) -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            limit,
        }
    }

    fn is_full(&self) -> bool {
        self.errors.len() >= self.limit
    }

    /// Record an error; returns false once the limit is reached.
    fn push(&mut self, error: TaskError) -> bool {
        if self.is_full() {
            return false;
        }
        self.errors.push(error);
        if self.is_full() {
            self.warnings
                .push(format!("reached error limit: {}", self.limit));
            return false;
        }
        true
    }
}

/// Validate one normalized resource against its table schema.
pub fn validate_resource(resource: &NormalizedResource, limit_errors: usize) -> EngineResult<TaskReport> {
    let started = Instant::now();
    let schema = CompiledSchema::compile(resource.name(), &resource.descriptor.resource.schema)?;
    let table = &resource.table;

    let mut findings = Findings::new(limit_errors);
    if check_labels(&schema, &table.labels, &mut findings) {
        check_rows(&schema, resource, &mut findings);
    }

    let errors = findings.errors.len();
    let warnings = findings.warnings.len();
    tracing::debug!(resource = %resource.name(), errors, warnings, "resource checked");

    Ok(TaskReport {
        name: resource.name().to_string(),
        task_type: "table",
        valid: findings.errors.is_empty(),
        place: resource.descriptor.path.display().to_string(),
        labels: table.labels.clone(),
        stats: TaskStats {
            errors,
            warnings,
            seconds: round_seconds(started.elapsed().as_secs_f64()),
            rows: table.rows.len(),
            fields: schema.fields.len(),
            bytes: table.bytes,
            encoding: table.encoding.clone(),
        },
        warnings: findings.warnings,
        errors: findings.errors,
    })
}

/// Compare the header against the declared fields, position by position.
fn check_labels(schema: &CompiledSchema, labels: &[String], findings: &mut Findings) -> bool {
    let width = labels.len().max(schema.fields.len());

    for index in 0..width {
        let number = index + 1;
        let field = schema.fields.get(index);

        let error = match (labels.get(index), field) {
            (Some(label), Some(field)) if label.trim().is_empty() => Some(TaskError::label(
                ErrorKind::BlankLabel,
                labels,
                label,
                field.name(),
                number,
                "",
            )),
            (Some(label), field) if labels[..index].contains(label) => {
                let positions: Vec<String> = labels[..index]
                    .iter()
                    .enumerate()
                    .filter(|(_, earlier)| *earlier == label)
                    .map(|(position, _)| (position + 1).to_string())
                    .collect();
                Some(TaskError::label(
                    ErrorKind::DuplicateLabel,
                    labels,
                    label,
                    field.map(CompiledField::name).unwrap_or(""),
                    number,
                    format!("at position \"{}\"", positions.join(", ")),
                ))
            }
            (Some(label), Some(field)) if label != field.name() => Some(TaskError::label(
                ErrorKind::IncorrectLabel,
                labels,
                label,
                field.name(),
                number,
                "",
            )),
            (Some(label), None) => Some(TaskError::label(
                ErrorKind::ExtraLabel,
                labels,
                label,
                "",
                number,
                "",
            )),
            (None, Some(field)) => Some(TaskError::label(
                ErrorKind::MissingLabel,
                labels,
                "",
                field.name(),
                number,
                "",
            )),
            _ => None,
        };

        if let Some(error) = error {
            if !findings.push(error) {
                return false;
            }
        }
    }
    true
}

fn check_rows(schema: &CompiledSchema, resource: &NormalizedResource, findings: &mut Findings) {
    // cast value key -> first row number, per unique field
    let mut seen_unique: HashMap<usize, HashMap<String, usize>> = HashMap::new();
    let mut seen_keys: HashMap<Vec<String>, usize> = HashMap::new();

    for row in &resource.table.rows {
        let cells = &row.cells;

        if cells.iter().all(|cell| schema.is_missing(cell) || cell.trim().is_empty()) {
            if !findings.push(TaskError::row(ErrorKind::BlankRow, row.number, cells, "")) {
                return;
            }
            continue;
        }

        let width = cells.len().max(schema.fields.len());
        for index in 0..width {
            let number = index + 1;
            let error = match (cells.get(index), schema.fields.get(index)) {
                (Some(cell), None) => Some(TaskError::cell(
                    ErrorKind::ExtraCell,
                    row.number,
                    cells,
                    cell,
                    "",
                    number,
                    "",
                )),
                (None, Some(field)) => Some(TaskError::cell(
                    ErrorKind::MissingCell,
                    row.number,
                    cells,
                    "",
                    field.name(),
                    number,
                    "",
                )),
                (Some(cell), Some(field)) => {
                    check_cell(schema, field, index, row.number, cells, cell, &mut seen_unique)
                }
                (None, None) => None,
            };

            if let Some(error) = error {
                if !findings.push(error) {
                    return;
                }
            }
        }

        if let Some(error) = check_primary_key(schema, row.number, cells, &mut seen_keys) {
            if !findings.push(error) {
                return;
            }
        }
    }
}

fn check_cell(
    schema: &CompiledSchema,
    field: &CompiledField,
    index: usize,
    row_number: usize,
    cells: &[String],
    cell: &str,
    seen_unique: &mut HashMap<usize, HashMap<String, usize>>,
) -> Option<TaskError> {
    let number = index + 1;
    let constraint = |note: String| {
        TaskError::cell(
            ErrorKind::ConstraintError,
            row_number,
            cells,
            cell,
            field.name(),
            number,
            note,
        )
    };
    let constraints = &field.schema.constraints;

    if schema.is_missing(cell) {
        return constraints
            .required
            .then(|| constraint("constraint \"required\" is \"True\"".to_string()));
    }

    let Some(value) = cast(&field.schema, cell) else {
        return Some(TaskError::cell(
            ErrorKind::TypeError,
            row_number,
            cells,
            cell,
            field.name(),
            number,
            format!("type is \"{}\"", field.schema.type_label()),
        ));
    };

    if let Some(allowed) = &field.enumeration {
        if !allowed.contains(&value) {
            let listed = constraints
                .enumeration
                .as_ref()
                .map(|values| serde_json::Value::from(values.clone()).to_string())
                .unwrap_or_default();
            return Some(constraint(format!("constraint \"enum\" is \"{}\"", listed)));
        }
    }

    if let Some(pattern) = &field.pattern {
        if !pattern.is_match(cell) {
            return Some(constraint(format!(
                "constraint \"pattern\" is \"{}\"",
                constraints.pattern.as_deref().unwrap_or_default()
            )));
        }
    }

    if let Some(length) = value.length() {
        if let Some(min) = constraints.min_length.filter(|min| length < *min) {
            return Some(constraint(format!("constraint \"minLength\" is \"{}\"", min)));
        }
        if let Some(max) = constraints.max_length.filter(|max| length > *max) {
            return Some(constraint(format!("constraint \"maxLength\" is \"{}\"", max)));
        }
    }

    if let Some(min) = field.minimum.as_ref().filter(|min| value < **min) {
        return Some(constraint(format!("constraint \"minimum\" is \"{}\"", min)));
    }
    if let Some(max) = field.maximum.as_ref().filter(|max| value > **max) {
        return Some(constraint(format!("constraint \"maximum\" is \"{}\"", max)));
    }

    if constraints.unique {
        let seen = seen_unique.entry(index).or_default();
        if let Some(first) = seen.get(&unique_key(&value)) {
            return Some(TaskError::cell(
                ErrorKind::UniqueError,
                row_number,
                cells,
                cell,
                field.name(),
                number,
                format!("the same as in the row at position \"{}\"", first),
            ));
        }
        seen.insert(unique_key(&value), row_number);
    }

    None
}

fn check_primary_key(
    schema: &CompiledSchema,
    row_number: usize,
    cells: &[String],
    seen_keys: &mut HashMap<Vec<String>, usize>,
) -> Option<TaskError> {
    if schema.primary_key.is_empty() {
        return None;
    }

    let mut key = Vec::with_capacity(schema.primary_key.len());
    for &position in &schema.primary_key {
        let cell = cells.get(position)?;
        if schema.is_missing(cell) {
            return None;
        }
        let value = cast(&schema.fields[position].schema, cell)?;
        key.push(unique_key(&value));
    }

    match seen_keys.get(&key) {
        Some(first) => Some(TaskError::row(
            ErrorKind::PrimaryKey,
            row_number,
            cells,
            format!("the same as in the row at position \"{}\"", first),
        )),
        None => {
            seen_keys.insert(key, row_number);
            None
        }
    }
}

fn unique_key(value: &CellValue) -> String {
    value.key()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResourceDescriptor, ResourceSchema};
    use crate::parser::parse_bytes;
    use serde_json::{json, Map};
    use std::path::PathBuf;

    fn resource(schema: serde_json::Value, csv: &str) -> NormalizedResource {
        NormalizedResource {
            descriptor: ResourceDescriptor {
                resource: ResourceSchema {
                    name: "screening_data".to_string(),
                    schema,
                    extra: Map::new(),
                },
                path: PathBuf::from("/data/SCREENING.csv"),
            },
            table: parse_bytes(csv.as_bytes(), None).unwrap(),
            normalized_fields: vec![],
        }
    }

    fn codes(task: &TaskReport) -> Vec<&str> {
        task.errors.iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_valid_table() {
        let r = resource(
            json!({ "fields": [ { "name": "ID" }, { "name": "AGE", "type": "integer" } ] }),
            "ID,AGE\nA1,30\nB2,41",
        );
        let task = validate_resource(&r, 1000).unwrap();

        assert!(task.valid);
        assert_eq!(task.stats.rows, 2);
        assert_eq!(task.stats.fields, 2);
        assert_eq!(task.place, "/data/SCREENING.csv");
        assert_eq!(task.labels, vec!["ID", "AGE"]);
    }

    #[test]
    fn test_type_error_coordinates() {
        let r = resource(
            json!({ "fields": [ { "name": "ID" }, { "name": "AGE", "type": "integer" } ] }),
            "ID,AGE\nA1,thirty",
        );
        let task = validate_resource(&r, 1000).unwrap();

        assert_eq!(codes(&task), vec!["type-error"]);
        let err = &task.errors[0];
        assert_eq!(err.row_number, Some(2));
        assert_eq!(err.field_number, Some(2));
        assert_eq!(err.field_name.as_deref(), Some("AGE"));
        assert_eq!(err.note, "type is \"integer/default\"");
    }

    #[test]
    fn test_required_and_enum() {
        let r = resource(
            json!({ "fields": [
                { "name": "ID", "constraints": { "required": true } },
                { "name": "GENDER", "constraints": { "enum": ["female", "male"] } }
            ] }),
            "ID,GENDER\n,female\nA2,unknown",
        );
        let task = validate_resource(&r, 1000).unwrap();

        assert_eq!(codes(&task), vec!["constraint-error", "constraint-error"]);
        assert!(task.errors[0].note.contains("required"));
        assert_eq!(task.errors[1].row_number, Some(3));
        assert!(task.errors[1].note.contains("enum"));
    }

    #[test]
    fn test_pattern_length_and_range() {
        let r = resource(
            json!({ "fields": [
                { "name": "ZIP", "constraints": { "pattern": "[0-9]{5}" } },
                { "name": "NAME", "constraints": { "minLength": 2, "maxLength": 4 } },
                { "name": "AGE", "type": "integer", "constraints": { "minimum": 0, "maximum": 120 } }
            ] }),
            "ZIP,NAME,AGE\n123456,Al,30\n12345,A,30\n12345,Alexa,30\n12345,Al,-1\n12345,Al,121",
        );
        let task = validate_resource(&r, 1000).unwrap();

        let notes: Vec<&str> = task.errors.iter().map(|e| e.note.as_str()).collect();
        assert_eq!(task.errors.len(), 5);
        assert!(notes[0].contains("pattern"));
        assert!(notes[1].contains("minLength"));
        assert!(notes[2].contains("maxLength"));
        assert!(notes[3].contains("minimum"));
        assert!(notes[4].contains("maximum"));
    }

    #[test]
    fn test_unique_and_primary_key() {
        let r = resource(
            json!({
                "fields": [
                    { "name": "ID", "type": "integer", "constraints": { "unique": true } },
                    { "name": "CODE" }
                ],
                "primaryKey": "CODE"
            }),
            "ID,CODE\n1,a\n01,b\n2,a",
        );
        let task = validate_resource(&r, 1000).unwrap();

        assert_eq!(codes(&task), vec!["unique-error", "primary-key"]);
        assert_eq!(task.errors[0].row_number, Some(3));
        assert_eq!(task.errors[0].note, "the same as in the row at position \"2\"");
        assert_eq!(task.errors[1].row_number, Some(4));
    }

    #[test]
    fn test_label_errors() {
        let r = resource(
            json!({ "fields": [ { "name": "ID" }, { "name": "GENDER" }, { "name": "STATE" } ] }),
            "ID,SEX\nA1,female",
        );
        let task = validate_resource(&r, 1000).unwrap();

        assert_eq!(
            codes(&task),
            vec!["incorrect-label", "missing-label", "missing-cell"]
        );
    }

    #[test]
    fn test_extra_and_duplicate_labels() {
        let r = resource(json!({ "fields": [ { "name": "ID" } ] }), "ID,ID\nA1,A1");
        let task = validate_resource(&r, 1000).unwrap();

        assert_eq!(codes(&task), vec!["duplicate-label", "extra-cell"]);
        assert_eq!(task.errors[0].field_number, Some(2));
    }

    #[test]
    fn test_blank_row_and_ragged_rows() {
        let r = resource(
            json!({ "fields": [ { "name": "A" }, { "name": "B" } ] }),
            "A,B\n,\nx\nx,y,z",
        );
        let task = validate_resource(&r, 1000).unwrap();

        assert_eq!(codes(&task), vec!["blank-row", "missing-cell", "extra-cell"]);
        assert_eq!(task.errors[0].row_number, Some(2));
        assert_eq!(task.errors[2].field_number, Some(3));
    }

    #[test]
    fn test_error_limit() {
        let r = resource(
            json!({ "fields": [ { "name": "N", "type": "integer" } ] }),
            "N\na\nb\nc\nd",
        );
        let task = validate_resource(&r, 2).unwrap();

        assert_eq!(task.errors.len(), 2);
        assert_eq!(task.warnings, vec!["reached error limit: 2"]);
        assert!(!task.valid);
    }

    #[test]
    fn test_invalid_schema_is_engine_error() {
        let r = resource(json!({ "fields": [ { "name": "X", "type": "geopoint" } ] }), "X\n1");
        assert!(validate_resource(&r, 1000).is_err());
    }
}
