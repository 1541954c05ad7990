//! Validation engines.
//!
//! The pipeline only sees [`ValidationEngine`]: a normalized package goes in,
//! an opaque JSON report comes out. [`TableSchemaEngine`] is the bundled
//! implementation, producing Frictionless-shaped reports.

pub mod cast;
pub mod checks;
pub mod report;
pub mod schema;

use serde_json::Value;
use std::time::Instant;

use crate::config::DEFAULT_LIMIT_ERRORS;
use crate::error::EngineResult;
use crate::normalize::NormalizedPackage;

pub use report::{ErrorKind, Report, TaskReport};

/// Validates a normalized package and reports as JSON.
pub trait ValidationEngine {
    fn validate(&self, package: &NormalizedPackage) -> EngineResult<Value>;
}

/// Table Schema checks over every resource of the package.
#[derive(Debug, Clone)]
pub struct TableSchemaEngine {
    limit_errors: usize,
}

impl TableSchemaEngine {
    pub fn new(limit_errors: usize) -> Self {
        Self {
            limit_errors: limit_errors.max(1),
        }
    }

    pub fn limit_errors(&self) -> usize {
        self.limit_errors
    }

    /// Build the typed report.
    pub fn report(&self, package: &NormalizedPackage) -> EngineResult<Report> {
        let started = Instant::now();
        let tasks = package
            .resources
            .iter()
            .map(|resource| checks::validate_resource(resource, self.limit_errors))
            .collect::<EngineResult<Vec<_>>>()?;

        let report = Report::from_tasks(tasks, started.elapsed().as_secs_f64());
        tracing::info!(
            package = %package.name,
            valid = report.valid,
            errors = report.stats.errors,
            "package validated"
        );
        Ok(report)
    }
}

impl Default for TableSchemaEngine {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT_ERRORS)
    }
}

impl ValidationEngine for TableSchemaEngine {
    fn validate(&self, package: &NormalizedPackage) -> EngineResult<Value> {
        Ok(serde_json::to_value(self.report(package)?)?)
    }
}
