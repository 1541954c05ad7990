//! Result envelope.
//!
//! Every run ends with exactly one JSON document:
//!
//! ```json
//! {
//!     "errorsSummary": [ { "rowNumber": null, "fieldNumber": null, "fieldName": "qe_admin_data",
//!                          "message": "File for resource 'qe_admin_data' not found.",
//!                          "type": "file-missing-error" } ],
//!     "report": null
//! }
//! ```
//!
//! `errorsSummary` holds orchestration failures only. Row-level findings live in
//! the engine's `report`, which is copied through untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ReportError;
use crate::logs::{log_success, log_warning};

/// Vocabulary of the `type` field of an [`ErrorRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorType {
    ArgumentError,
    FileMissingError,
    DirectoryMissingError,
    UnexpectedError,
    ValidationError,
}

/// One orchestration failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub row_number: Option<usize>,
    pub field_number: Option<usize>,
    pub field_name: Option<String>,
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ErrorType,
}

impl ErrorRecord {
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            row_number: None,
            field_number: None,
            field_name: None,
            message: message.into(),
            error_type,
        }
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }
}

/// The document written to the output path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    pub errors_summary: Vec<ErrorRecord>,
    pub report: Option<Value>,
}

impl ResultEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Envelope holding a single record and no report.
    pub fn single(record: ErrorRecord) -> Self {
        Self {
            errors_summary: vec![record],
            report: None,
        }
    }

    pub fn push(&mut self, record: ErrorRecord) {
        self.errors_summary.push(record);
    }

    pub fn set_report(&mut self, report: Value) {
        self.report = Some(report);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors_summary.is_empty()
    }

    /// JSON text with 4-space indentation.
    pub fn to_json(&self) -> Result<String, ReportError> {
        let mut buffer = Vec::new();
        self.serialize_into(&mut buffer)?;
        // serde_json only emits UTF-8
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write the envelope to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        let io_error = |source| ReportError::Io {
            path: path.display().to_string(),
            source,
        };

        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        self.serialize_into(&mut writer)?;
        writer.flush().map_err(io_error)?;

        tracing::debug!(
            path = %path.display(),
            records = self.errors_summary.len(),
            has_report = self.report.is_some(),
            "envelope written"
        );
        Ok(())
    }

    fn serialize_into<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        self.serialize(&mut serializer)?;
        Ok(())
    }
}

/// Print the closing console line of a completed run.
pub fn print_summary(envelope: &ResultEnvelope, output: &Path) {
    if envelope.has_errors() {
        log_warning(format!(
            "Validation completed with errors. Results saved to '{}'.",
            output.display()
        ));
    } else {
        log_success(format!(
            "Validation completed successfully. Results saved to '{}'.",
            output.display()
        ));
    }
}
