//! Validation report structures.
//!
//! The layout follows the Frictionless report format so existing consumers of
//! the IG validation output keep working: a package-level summary and one task
//! per resource, each error carrying row/field coordinates in camelCase.

use serde::Serialize;

/// Kinds of findings the engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BlankLabel,
    DuplicateLabel,
    MissingLabel,
    ExtraLabel,
    IncorrectLabel,
    BlankRow,
    ExtraCell,
    MissingCell,
    TypeError,
    ConstraintError,
    UniqueError,
    PrimaryKey,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::BlankLabel => "blank-label",
            ErrorKind::DuplicateLabel => "duplicate-label",
            ErrorKind::MissingLabel => "missing-label",
            ErrorKind::ExtraLabel => "extra-label",
            ErrorKind::IncorrectLabel => "incorrect-label",
            ErrorKind::BlankRow => "blank-row",
            ErrorKind::ExtraCell => "extra-cell",
            ErrorKind::MissingCell => "missing-cell",
            ErrorKind::TypeError => "type-error",
            ErrorKind::ConstraintError => "constraint-error",
            ErrorKind::UniqueError => "unique-error",
            ErrorKind::PrimaryKey => "primary-key",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::BlankLabel => "Blank Label",
            ErrorKind::DuplicateLabel => "Duplicate Label",
            ErrorKind::MissingLabel => "Missing Label",
            ErrorKind::ExtraLabel => "Extra Label",
            ErrorKind::IncorrectLabel => "Incorrect Label",
            ErrorKind::BlankRow => "Blank Row",
            ErrorKind::ExtraCell => "Extra Cell",
            ErrorKind::MissingCell => "Missing Cell",
            ErrorKind::TypeError => "Type Error",
            ErrorKind::ConstraintError => "Constraint Error",
            ErrorKind::UniqueError => "Unique Error",
            ErrorKind::PrimaryKey => "PrimaryKey Error",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::BlankLabel => "A label in the header row is missing a value. Label should be provided and not be blank.",
            ErrorKind::DuplicateLabel => "Two columns in the header row have the same value. Column names should be unique.",
            ErrorKind::MissingLabel => "Based on the schema there should be a label that is missing in the data's header.",
            ErrorKind::ExtraLabel => "The header of the data source contains label that does not exist in the provided schema.",
            ErrorKind::IncorrectLabel => "One of the data source header does not match the field name defined in the schema.",
            ErrorKind::BlankRow => "This row is empty. A row should contain at least one value.",
            ErrorKind::ExtraCell => "This row has more values compared to the header row (the first row in the data source).",
            ErrorKind::MissingCell => "This row has less values compared to the header row (the first row in the data source).",
            ErrorKind::TypeError => "The value does not match the schema type and format for this field.",
            ErrorKind::ConstraintError => "A field value does not conform to a constraint.",
            ErrorKind::UniqueError => "This field is a unique field but it contains a value that has been used in another row.",
            ErrorKind::PrimaryKey => "Values in the primary key fields should be unique for every row",
        }
    }

    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            ErrorKind::BlankLabel
            | ErrorKind::DuplicateLabel
            | ErrorKind::MissingLabel
            | ErrorKind::ExtraLabel
            | ErrorKind::IncorrectLabel => &["#table", "#header", "#label"],
            ErrorKind::BlankRow | ErrorKind::PrimaryKey => &["#table", "#row"],
            ErrorKind::ExtraCell
            | ErrorKind::MissingCell
            | ErrorKind::TypeError
            | ErrorKind::ConstraintError
            | ErrorKind::UniqueError => &["#table", "#row", "#cell"],
        }
    }
}

/// One finding inside a task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskError {
    #[serde(rename = "type")]
    pub code: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub message: String,
    pub tags: Vec<&'static str>,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_number: Option<usize>,
}

impl TaskError {
    /// Header finding. `field_number` is one-based.
    pub fn label(
        kind: ErrorKind,
        labels: &[String],
        label: &str,
        field_name: &str,
        field_number: usize,
        note: impl Into<String>,
    ) -> Self {
        let note = note.into();
        let message = match kind {
            ErrorKind::BlankLabel => format!(
                "Label in the header in field at position \"{}\" is blank",
                field_number
            ),
            ErrorKind::DuplicateLabel => format!(
                "Label \"{}\" in the header at position \"{}\" is duplicated to a label: {}",
                label, field_number, note
            ),
            ErrorKind::MissingLabel => format!(
                "There is a missing label in the header's field \"{}\" at position \"{}\"",
                field_name, field_number
            ),
            ErrorKind::ExtraLabel => format!(
                "There is an extra label \"{}\" in header at position \"{}\"",
                label, field_number
            ),
            _ => format!(
                "Label \"{}\" in field {} at position \"{}\" does not match the field name in the schema",
                label, field_name, field_number
            ),
        };

        Self {
            labels: Some(labels.to_vec()),
            label: Some(label.to_string()),
            field_name: Some(field_name.to_string()),
            field_number: Some(field_number),
            ..Self::base(kind, message, note)
        }
    }

    /// Whole-row finding.
    pub fn row(kind: ErrorKind, row_number: usize, cells: &[String], note: impl Into<String>) -> Self {
        let note = note.into();
        let message = match kind {
            ErrorKind::BlankRow => format!("Row at position \"{}\" is completely blank", row_number),
            _ => format!(
                "Row at position \"{}\" violates the primary key: {}",
                row_number, note
            ),
        };

        Self {
            cells: Some(cells.to_vec()),
            row_number: Some(row_number),
            ..Self::base(kind, message, note)
        }
    }

    /// Single-cell finding. `field_number` is one-based.
    pub fn cell(
        kind: ErrorKind,
        row_number: usize,
        cells: &[String],
        cell: &str,
        field_name: &str,
        field_number: usize,
        note: impl Into<String>,
    ) -> Self {
        let note = note.into();
        let message = match kind {
            ErrorKind::ExtraCell => format!(
                "Row at position \"{}\" has an extra value in field at position \"{}\"",
                row_number, field_number
            ),
            ErrorKind::MissingCell => format!(
                "Row at position \"{}\" has a missing cell in field \"{}\" at position \"{}\"",
                row_number, field_name, field_number
            ),
            ErrorKind::TypeError => format!(
                "Type error in the cell \"{}\" in row \"{}\" and field \"{}\" at position \"{}\": {}",
                cell, row_number, field_name, field_number, note
            ),
            ErrorKind::UniqueError => format!(
                "Row at position \"{}\" has unique constraint violation in field \"{}\" at position \"{}\": {}",
                row_number, field_name, field_number, note
            ),
            _ => format!(
                "The cell \"{}\" in row at position \"{}\" and field \"{}\" at position \"{}\" does not conform to a constraint: {}",
                cell, row_number, field_name, field_number, note
            ),
        };

        Self {
            cells: Some(cells.to_vec()),
            row_number: Some(row_number),
            cell: Some(cell.to_string()),
            field_name: Some(field_name.to_string()),
            field_number: Some(field_number),
            ..Self::base(kind, message, note)
        }
    }

    fn base(kind: ErrorKind, message: String, note: String) -> Self {
        Self {
            code: kind.code(),
            title: kind.title(),
            description: kind.description(),
            message,
            tags: kind.tags().to_vec(),
            note,
            labels: None,
            label: None,
            cells: None,
            row_number: None,
            cell: None,
            field_name: None,
            field_number: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskStats {
    pub errors: usize,
    pub warnings: usize,
    pub seconds: f64,
    pub rows: usize,
    pub fields: usize,
    pub bytes: usize,
    pub encoding: String,
}

/// Per-resource section of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReport {
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: &'static str,
    pub valid: bool,
    pub place: String,
    pub labels: Vec<String>,
    pub stats: TaskStats,
    pub warnings: Vec<String>,
    pub errors: Vec<TaskError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportStats {
    pub tasks: usize,
    pub errors: usize,
    pub warnings: usize,
    pub seconds: f64,
}

/// Package-level report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub valid: bool,
    pub stats: ReportStats,
    pub warnings: Vec<String>,
    pub errors: Vec<TaskError>,
    pub tasks: Vec<TaskReport>,
}

impl Report {
    pub fn from_tasks(tasks: Vec<TaskReport>, seconds: f64) -> Self {
        let errors = tasks.iter().map(|task| task.errors.len()).sum();
        let warnings = tasks.iter().map(|task| task.warnings.len()).sum();

        Self {
            valid: tasks.iter().all(|task| task.valid),
            stats: ReportStats {
                tasks: tasks.len(),
                errors,
                warnings,
                seconds: round_seconds(seconds),
            },
            warnings: Vec::new(),
            errors: Vec::new(),
            tasks,
        }
    }
}

pub fn round_seconds(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
