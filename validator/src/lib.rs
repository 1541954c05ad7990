//! # csv-validate - CSV extract validation against an IG-derived specification
//!
//! Checks the admin, screening and demographic CSV extracts of a data directory
//! against the table schemas of a specification and writes one JSON envelope
//! describing the outcome.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────┐   ┌─────────────┐   ┌──────────┐   ┌──────────┐
//! │ Resolver │──▶│ Specification│──▶│  Package  │──▶│ Parser +    │──▶│  Engine  │──▶│ Reporter │
//! │ (prefix) │   │ (Draft 7)    │   │ descriptor│   │ Normalizer  │   │ (trait)  │   │ (JSON)   │
//! └──────────┘   └──────────────┘   └───────────┘   └─────────────┘   └──────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csv_validate::{validate_package, Invocation, TableSchemaEngine, ValidatorConfig};
//!
//! let invocation = Invocation {
//!     spec_path: "spec.json".into(),
//!     data_dir: "data".into(),
//!     output_path: "result.json".into(),
//! };
//! let outcome = validate_package(&invocation, &ValidatorConfig::default(), &TableSchemaEngine::default())?;
//! println!("{}", outcome.envelope.has_errors());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Run settings and the resource prefix table
//! - [`models`] - Specification, file mapping and package descriptor
//! - [`resolver`] - Prefix-based file resolution
//! - [`specification`] - Specification loading and descriptor checks
//! - [`package`] - Package descriptor assembly
//! - [`parser`] - CSV loading with auto-detection
//! - [`normalize`] - Categorical field normalization
//! - [`engine`] - Validation engine seam and Table Schema checks
//! - [`reporter`] - Result envelope
//! - [`pipeline`] - Run orchestration
//! - [`cli`] - Command-line front end
//! - [`logs`] - Console output and tracing setup

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Inputs
pub mod package;
pub mod parser;
pub mod resolver;
pub mod specification;

// Processing
pub mod engine;
pub mod normalize;

// Output and orchestration
pub mod cli;
pub mod pipeline;
pub mod reporter;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, EngineError, PipelineError, ReportError, SpecificationError};

// =============================================================================
// Re-exports - Models and configuration
// =============================================================================

pub use config::{ResourceBinding, ValidatorConfig};
pub use models::{FileMapping, PackageDescriptor, Resolution, ResourceDescriptor, Specification};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use engine::{TableSchemaEngine, ValidationEngine};
pub use normalize::{NormalizationRule, NormalizedPackage, Transform, NORMALIZATION_RULES};
pub use pipeline::{validate_package, Invocation, RunOutcome, Stage};
pub use reporter::{ErrorRecord, ErrorType, ResultEnvelope};
pub use resolver::{find_file, resolve_files};
