//! Run configuration.
//!
//! Defaults reproduce the IG validation setup: three logical resources matched
//! by fixed filename prefixes, a fixed package name and `output.json` as the
//! fallback output file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name given to every assembled package descriptor.
pub const PACKAGE_NAME: &str = "csv-validation-using-ig";

/// Output file used when the requested one is unusable.
pub const DEFAULT_OUTPUT: &str = "output.json";

/// Extension every resource file must carry.
pub const CSV_EXTENSION: &str = "csv";

/// Per-resource error cap of the bundled engine.
pub const DEFAULT_LIMIT_ERRORS: usize = 1000;

const LIMIT_ERRORS_ENV: &str = "CSV_VALIDATE_LIMIT_ERRORS";

/// Binds a logical resource name to the filename prefix of its CSV file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBinding {
    pub name: String,
    pub prefix: String,
}

impl ResourceBinding {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
        }
    }
}

/// Known resources, in reporting order.
pub fn default_resources() -> Vec<ResourceBinding> {
    vec![
        ResourceBinding::new("qe_admin_data", "QE_ADMIN_DATA"),
        ResourceBinding::new("screening_data", "SCREENING"),
        ResourceBinding::new("demographic_data", "DEMOGRAPHIC_DATA"),
    ]
}

/// Settings for one validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// Name of the assembled package descriptor.
    pub package_name: String,

    /// Fallback output path (argument errors, non-JSON output paths).
    pub default_output: PathBuf,

    /// Required file extension, without the dot.
    pub extension: String,

    /// Logical resource to filename prefix table.
    pub resources: Vec<ResourceBinding>,

    /// Maximum number of errors recorded per resource.
    pub limit_errors: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            package_name: PACKAGE_NAME.to_string(),
            default_output: PathBuf::from(DEFAULT_OUTPUT),
            extension: CSV_EXTENSION.to_string(),
            resources: default_resources(),
            limit_errors: DEFAULT_LIMIT_ERRORS,
        }
    }
}

impl ValidatorConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(LIMIT_ERRORS_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => config.limit_errors = limit,
                _ => tracing::warn!(
                    value = %raw,
                    "ignoring {LIMIT_ERRORS_ENV}: expected a positive integer"
                ),
            }
        }

        config
    }

    pub fn with_default_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_output = path.into();
        self
    }

    /// Prefix configured for a logical resource name.
    pub fn prefix_for(&self, name: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|binding| binding.name == name)
            .map(|binding| binding.prefix.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidatorConfig::default();
        assert_eq!(config.package_name, "csv-validation-using-ig");
        assert_eq!(config.default_output, PathBuf::from("output.json"));
        assert_eq!(config.extension, "csv");
        assert_eq!(config.limit_errors, 1000);
        assert_eq!(config.resources.len(), 3);
    }

    #[test]
    fn test_prefix_table() {
        let config = ValidatorConfig::default();
        assert_eq!(config.prefix_for("qe_admin_data"), Some("QE_ADMIN_DATA"));
        assert_eq!(config.prefix_for("screening_data"), Some("SCREENING"));
        assert_eq!(config.prefix_for("demographic_data"), Some("DEMOGRAPHIC_DATA"));
        assert_eq!(config.prefix_for("encounter_data"), None);
    }

    #[test]
    fn test_with_default_output() {
        let config = ValidatorConfig::default().with_default_output("/tmp/run/output.json");
        assert_eq!(config.default_output, PathBuf::from("/tmp/run/output.json"));
    }
}
