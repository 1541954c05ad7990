//! Error types for the CSV validation pipeline.
//!
//! Each layer owns its error enum:
//!
//! - [`CsvError`] - reading and decoding resource tables
//! - [`SpecificationError`] - loading the specification document
//! - [`EngineError`] - interpreting a resource schema inside the engine
//! - [`ReportError`] - serializing and writing the result envelope
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Conversions into [`PipelineError`] are automatic via `From`, so `?` works
//! across layer boundaries. [`PipelineError::error_type`] maps a fault onto the
//! envelope's error vocabulary.

use thiserror::Error;

use crate::reporter::ErrorType;

// =============================================================================
// CSV Reading Errors
// =============================================================================

/// Errors while loading a resource table from disk.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured delimiter cannot be used by the CSV reader.
    #[error("Unsupported delimiter {0:?}: only single-byte ASCII delimiters are allowed")]
    UnsupportedDelimiter(char),

    /// Invalid CSV format.
    #[error("Invalid CSV format in '{path}': {message}")]
    ParseError { path: String, message: String },
}

// =============================================================================
// Specification Errors
// =============================================================================

/// Errors while loading the specification document.
#[derive(Debug, Error)]
pub enum SpecificationError {
    /// Failed to read the specification file.
    #[error("Failed to read specification '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("Specification is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document does not match the descriptor schema.
    #[error("Invalid specification: {}", errors.join("; "))]
    Invalid { errors: Vec<String> },
}

// =============================================================================
// Engine Errors
// =============================================================================

/// Errors raised by the validation engine itself (not row-level findings).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The resource schema could not be interpreted.
    #[error("Invalid schema for resource '{resource}': {message}")]
    InvalidSchema { resource: String, message: String },

    /// A `pattern` constraint is not a valid regular expression.
    #[error("Invalid pattern for field '{field}' in resource '{resource}': {message}")]
    InvalidPattern {
        resource: String,
        field: String,
        message: String,
    },

    /// An `enum`, `minimum` or `maximum` constraint does not match the field type.
    #[error("Invalid constraint '{constraint}' for field '{field}' in resource '{resource}': value {value} is not a valid {field_type}")]
    InvalidConstraint {
        resource: String,
        field: String,
        constraint: &'static str,
        value: String,
        field_type: &'static str,
    },

    /// The report could not be converted to JSON.
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

// =============================================================================
// Report Errors
// =============================================================================

/// Errors while writing the result envelope.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Output file could not be created or written.
    #[error("Failed to write output '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Envelope serialization failed.
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// Wraps the lower-level errors and adds the missing-resource condition raised
/// when a package descriptor cannot be assembled.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A resource declared in the specification has no resolved file.
    #[error("File for resource '{resource}' not found.")]
    ResourceFileNotFound { resource: String },

    /// The data directory could not be listed.
    #[error("Failed to list data directory '{path}': {source}")]
    DataDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Specification error.
    #[error("{0}")]
    Specification(#[from] SpecificationError),

    /// CSV reading error.
    #[error("{0}")]
    Csv(#[from] CsvError),

    /// Validation engine error.
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// Output error.
    #[error("{0}")]
    Report(#[from] ReportError),
}

impl PipelineError {
    /// Classify the fault for the `errorsSummary` record.
    pub fn error_type(&self) -> ErrorType {
        match self {
            PipelineError::ResourceFileNotFound { .. } => ErrorType::FileMissingError,
            _ => ErrorType::UnexpectedError,
        }
    }

    /// Resource name for missing-resource faults.
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            PipelineError::ResourceFileNotFound { resource } => Some(resource),
            _ => None,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
