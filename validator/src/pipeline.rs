//! Validation run orchestration.
//!
//! ```text
//! Init → ArgsValidated → FilesResolved → PackageBuilt → Normalized → Validated → Reported
//!                             │                 └──────────┴────────────┴──▶ Faulted
//!                             └──▶ MissingFiles
//! ```
//!
//! Argument and environment checks happen in [`crate::cli`]. From
//! `FilesResolved` on, every outcome is written to the output path as a
//! [`ResultEnvelope`]; only a failure to write the envelope escapes as an error.

use std::path::PathBuf;

use crate::config::ValidatorConfig;
use crate::engine::ValidationEngine;
use crate::error::{PipelineError, PipelineResult};
use crate::logs::log_info;
use crate::models::FileMapping;
use crate::normalize::{normalize_package, NORMALIZATION_RULES};
use crate::package::build_package;
use crate::reporter::{print_summary, ErrorRecord, ErrorType, ResultEnvelope};
use crate::resolver::resolve_files;
use crate::specification::load_specification;

/// Process exit code once the envelope is written, whatever the final stage.
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code of argument, environment and top-level failures.
pub const EXIT_FAILURE: i32 = 1;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ArgsValidated,
    FilesResolved,
    PackageBuilt,
    Normalized,
    Validated,
    Reported,
    MissingFiles,
    Faulted,
}

/// The three positional inputs, after output path coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub spec_path: PathBuf,
    pub data_dir: PathBuf,
    pub output_path: PathBuf,
}

/// What a run wrote.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Last stage reached before the envelope was written
    pub stage: Stage,
    pub envelope: ResultEnvelope,
}

fn enter(stage: Stage) {
    tracing::debug!(?stage, "entering stage");
}

/// Run the pipeline from file resolution to the written envelope.
pub fn validate_package(
    invocation: &Invocation,
    config: &ValidatorConfig,
    engine: &dyn ValidationEngine,
) -> PipelineResult<RunOutcome> {
    let mut envelope = ResultEnvelope::new();

    let stage = match resolve(invocation, config) {
        Ok(mapping) if !mapping.is_complete() => {
            for resource in mapping.unresolved() {
                tracing::warn!(resource, "resource file missing");
                envelope.push(
                    ErrorRecord::new(
                        ErrorType::FileMissingError,
                        format!("File for resource '{}' not found.", resource),
                    )
                    .with_field_name(resource),
                );
            }
            Stage::MissingFiles
        }
        Ok(mapping) => match process(invocation, config, engine, &mapping) {
            Ok(report) => {
                envelope.set_report(report);
                Stage::Validated
            }
            Err(e) => {
                tracing::error!(error = %e, "validation faulted");
                envelope.push(fault_record(&e));
                Stage::Faulted
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "file resolution faulted");
            envelope.push(fault_record(&e));
            Stage::Faulted
        }
    };
    enter(stage);

    envelope.write(&invocation.output_path)?;

    match stage {
        Stage::MissingFiles => log_info(format!(
            "Validation skipped due to missing files. Results saved to '{}'.",
            invocation.output_path.display()
        )),
        _ => {
            enter(Stage::Reported);
            print_summary(&envelope, &invocation.output_path);
        }
    }

    Ok(RunOutcome { stage, envelope })
}

fn resolve(invocation: &Invocation, config: &ValidatorConfig) -> PipelineResult<FileMapping> {
    let mapping = resolve_files(&invocation.data_dir, &config.resources, &config.extension)
        .map_err(|source| PipelineError::DataDirectory {
            path: invocation.data_dir.display().to_string(),
            source,
        })?;
    enter(Stage::FilesResolved);
    Ok(mapping)
}

fn process(
    invocation: &Invocation,
    config: &ValidatorConfig,
    engine: &dyn ValidationEngine,
    mapping: &FileMapping,
) -> PipelineResult<serde_json::Value> {
    let specification = load_specification(&invocation.spec_path)?;

    let package = build_package(&specification, mapping, &config.package_name)?;
    enter(Stage::PackageBuilt);

    let normalized = normalize_package(package, NORMALIZATION_RULES)?;
    enter(Stage::Normalized);

    let report = engine.validate(&normalized)?;
    Ok(report)
}

/// Envelope record for a fault inside the pipeline.
fn fault_record(error: &PipelineError) -> ErrorRecord {
    let record = ErrorRecord::new(error.error_type(), error.to_string());
    match error.resource_name() {
        Some(resource) => record.with_field_name(resource),
        None => record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TableSchemaEngine;
    use crate::error::{EngineError, EngineResult};
    use crate::normalize::NormalizedPackage;
    use serde_json::{json, Value};
    use std::cell::Cell;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    /// Records calls and returns a fixed report.
    struct StubEngine {
        calls: Cell<usize>,
        report: Value,
    }

    impl StubEngine {
        fn new(report: Value) -> Self {
            Self { calls: Cell::new(0), report }
        }
    }

    impl ValidationEngine for StubEngine {
        fn validate(&self, _package: &NormalizedPackage) -> EngineResult<Value> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.report.clone())
        }
    }

    struct FailingEngine;

    impl ValidationEngine for FailingEngine {
        fn validate(&self, package: &NormalizedPackage) -> EngineResult<Value> {
            Err(EngineError::InvalidSchema {
                resource: package.resources[0].name().to_string(),
                message: "engine exploded".to_string(),
            })
        }
    }

    /// Captures the normalized cells the engine receives.
    struct CapturingEngine {
        seen: std::cell::RefCell<Vec<Vec<String>>>,
    }

    impl ValidationEngine for CapturingEngine {
        fn validate(&self, package: &NormalizedPackage) -> EngineResult<Value> {
            for resource in &package.resources {
                for row in &resource.table.rows {
                    self.seen.borrow_mut().push(row.cells.clone());
                }
            }
            Ok(json!({ "valid": true }))
        }
    }

    fn specification() -> Value {
        json!({
            "resources": [
                { "name": "qe_admin_data", "schema": { "fields": [
                    { "name": "PATIENT_MR_ID_VALUE", "constraints": { "required": true } },
                    { "name": "FACILITY_STATE", "constraints": { "enum": ["ny", "nj"] } }
                ] } },
                { "name": "screening_data", "schema": { "fields": [
                    { "name": "PATIENT_MR_ID_VALUE" },
                    { "name": "SCREENING_STATUS_CODE", "constraints": { "enum": ["final", "amended"] } }
                ] } },
                { "name": "demographic_data", "schema": { "fields": [
                    { "name": "PATIENT_MR_ID_VALUE" },
                    { "name": "GENDER", "constraints": { "enum": ["female", "male", "other"] } }
                ] } }
            ]
        })
    }

    struct Workspace {
        _root: TempDir,
        invocation: Invocation,
        config: ValidatorConfig,
    }

    impl Workspace {
        fn new(spec: &Value) -> Self {
            let root = tempdir().unwrap();
            let data_dir = root.path().join("data");
            std::fs::create_dir(&data_dir).unwrap();
            let spec_path = root.path().join("spec.json");
            std::fs::write(&spec_path, serde_json::to_string(spec).unwrap()).unwrap();

            let config = ValidatorConfig::default()
                .with_default_output(root.path().join("output.json"));
            let invocation = Invocation {
                spec_path,
                data_dir,
                output_path: root.path().join("result.json"),
            };
            Self { _root: root, invocation, config }
        }

        fn add(&self, file: &str, content: &str) {
            std::fs::write(self.invocation.data_dir.join(file), content).unwrap();
        }

        fn add_all(&self) {
            self.add("QE_ADMIN_DATA_2024.csv", "PATIENT_MR_ID_VALUE,FACILITY_STATE\nMRN-1,NY\n");
            self.add("SCREENING_2024.csv", "PATIENT_MR_ID_VALUE,SCREENING_STATUS_CODE\nMRN-1,Final\n");
            self.add("DEMOGRAPHIC_DATA_2024.csv", "PATIENT_MR_ID_VALUE,GENDER\nMRN-1,Female\n");
        }

        fn output(&self) -> Value {
            read_json(&self.invocation.output_path)
        }
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_conformant_package() {
        let ws = Workspace::new(&specification());
        ws.add_all();

        let engine = TableSchemaEngine::default();
        let outcome = validate_package(&ws.invocation, &ws.config, &engine).unwrap();

        assert_eq!(outcome.stage, Stage::Validated);
        let output = ws.output();
        assert_eq!(output["errorsSummary"], json!([]));
        assert_eq!(output["report"]["valid"], true);
        assert_eq!(output["report"]["stats"]["errors"], 0);
        assert_eq!(output["report"]["tasks"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_missing_admin_file() {
        let ws = Workspace::new(&specification());
        ws.add("SCREENING_2024.csv", "PATIENT_MR_ID_VALUE\nMRN-1\n");
        ws.add("DEMOGRAPHIC_DATA_X.csv", "PATIENT_MR_ID_VALUE\nMRN-1\n");

        let engine = StubEngine::new(json!({}));
        let outcome = validate_package(&ws.invocation, &ws.config, &engine).unwrap();

        assert_eq!(outcome.stage, Stage::MissingFiles);
        assert_eq!(engine.calls.get(), 0);
        assert_eq!(
            ws.output(),
            json!({
                "errorsSummary": [ {
                    "rowNumber": null,
                    "fieldNumber": null,
                    "fieldName": "qe_admin_data",
                    "message": "File for resource 'qe_admin_data' not found.",
                    "type": "file-missing-error"
                } ],
                "report": null
            })
        );
    }

    #[test]
    fn test_all_files_missing_is_deterministic() {
        let ws = Workspace::new(&specification());
        let engine = StubEngine::new(json!({}));

        validate_package(&ws.invocation, &ws.config, &engine).unwrap();
        let first = std::fs::read(&ws.invocation.output_path).unwrap();
        validate_package(&ws.invocation, &ws.config, &engine).unwrap();
        let second = std::fs::read(&ws.invocation.output_path).unwrap();

        assert_eq!(first, second);
        let names: Vec<Value> = ws.output()["errorsSummary"]
            .as_array()
            .unwrap()
            .iter()
            .map(|record| record["fieldName"].clone())
            .collect();
        assert_eq!(
            names,
            vec![json!("qe_admin_data"), json!("screening_data"), json!("demographic_data")]
        );
    }

    #[test]
    fn test_files_resolved_before_specification_is_read() {
        let ws = Workspace::new(&specification());
        std::fs::write(&ws.invocation.spec_path, "{ not json").unwrap();

        let engine = StubEngine::new(json!({}));
        let outcome = validate_package(&ws.invocation, &ws.config, &engine).unwrap();

        assert_eq!(outcome.stage, Stage::MissingFiles);
    }

    #[test]
    fn test_malformed_specification_is_unexpected_error() {
        let ws = Workspace::new(&specification());
        ws.add_all();
        std::fs::write(&ws.invocation.spec_path, "{ not json").unwrap();

        let engine = StubEngine::new(json!({}));
        let outcome = validate_package(&ws.invocation, &ws.config, &engine).unwrap();

        assert_eq!(outcome.stage, Stage::Faulted);
        let output = ws.output();
        assert_eq!(output["errorsSummary"][0]["type"], "unexpected-error");
        assert_eq!(output["report"], Value::Null);
        assert_eq!(engine.calls.get(), 0);
    }

    #[test]
    fn test_unknown_resource_fails_as_missing_file() {
        let mut spec = specification();
        spec["resources"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "name": "encounter_data", "schema": { "fields": [ { "name": "ID" } ] } }));
        let ws = Workspace::new(&spec);
        ws.add_all();

        let engine = StubEngine::new(json!({}));
        let outcome = validate_package(&ws.invocation, &ws.config, &engine).unwrap();

        assert_eq!(outcome.stage, Stage::Faulted);
        let record = &ws.output()["errorsSummary"][0];
        assert_eq!(record["type"], "file-missing-error");
        assert_eq!(record["fieldName"], "encounter_data");
        assert_eq!(record["message"], "File for resource 'encounter_data' not found.");
    }

    #[test]
    fn test_engine_fault_is_unexpected_error() {
        let ws = Workspace::new(&specification());
        ws.add_all();

        let outcome = validate_package(&ws.invocation, &ws.config, &FailingEngine).unwrap();

        assert_eq!(outcome.stage, Stage::Faulted);
        let record = &ws.output()["errorsSummary"][0];
        assert_eq!(record["type"], "unexpected-error");
        assert!(record["message"].as_str().unwrap().contains("engine exploded"));
        assert_eq!(record["fieldName"], Value::Null);
    }

    #[test]
    fn test_report_passed_through_verbatim() {
        let ws = Workspace::new(&specification());
        ws.add_all();
        let report = json!({ "valid": false, "custom": { "nested": [1, 2, 3] } });

        let engine = StubEngine::new(report.clone());
        validate_package(&ws.invocation, &ws.config, &engine).unwrap();

        assert_eq!(engine.calls.get(), 1);
        assert_eq!(ws.output()["report"], report);
        assert_eq!(ws.output()["errorsSummary"], json!([]));
    }

    #[test]
    fn test_engine_receives_normalized_cells() {
        let ws = Workspace::new(&specification());
        ws.add_all();

        let engine = CapturingEngine { seen: Default::default() };
        validate_package(&ws.invocation, &ws.config, &engine).unwrap();

        let seen = engine.seen.borrow();
        assert!(seen.contains(&vec!["MRN-1".to_string(), "ny".to_string()]));
        assert!(seen.contains(&vec!["MRN-1".to_string(), "final".to_string()]));
        assert!(seen.contains(&vec!["MRN-1".to_string(), "female".to_string()]));
    }

    #[test]
    fn test_missing_value_markers_survive_normalization() {
        let mut spec = specification();
        spec["resources"][2]["schema"]["missingValues"] = json!(["", "NA"]);
        let ws = Workspace::new(&spec);
        ws.add_all();
        ws.add("DEMOGRAPHIC_DATA_2024.csv", "PATIENT_MR_ID_VALUE,GENDER\nMRN-1,NA\nMRN-2,Male\n");

        let engine = TableSchemaEngine::default();
        validate_package(&ws.invocation, &ws.config, &engine).unwrap();

        let output = ws.output();
        assert_eq!(output["report"]["tasks"][2]["name"], "demographic_data");
        assert_eq!(output["report"]["tasks"][2]["errors"], json!([]));
        assert_eq!(output["report"]["valid"], true);
    }

    #[test]
    fn test_content_errors_stay_in_report() {
        let ws = Workspace::new(&specification());
        ws.add("QE_ADMIN_DATA_2024.csv", "PATIENT_MR_ID_VALUE,FACILITY_STATE\n,CA\n");
        ws.add("SCREENING_2024.csv", "PATIENT_MR_ID_VALUE,SCREENING_STATUS_CODE\nMRN-1,FINAL\n");
        ws.add("DEMOGRAPHIC_DATA_2024.csv", "PATIENT_MR_ID_VALUE,GENDER\nMRN-1,MALE\n");

        let engine = TableSchemaEngine::default();
        validate_package(&ws.invocation, &ws.config, &engine).unwrap();

        let output = ws.output();
        assert_eq!(output["errorsSummary"], json!([]));
        assert_eq!(output["report"]["valid"], false);
        assert_eq!(output["report"]["tasks"][0]["stats"]["errors"], 2);
        assert_eq!(output["report"]["tasks"][1]["valid"], true);
        assert_eq!(output["report"]["tasks"][2]["valid"], true);
    }

    #[test]
    fn test_unwritable_output_escapes() {
        let ws = Workspace::new(&specification());
        let mut invocation = ws.invocation.clone();
        invocation.output_path = ws.invocation.data_dir.join("missing").join("out.json");

        let err = validate_package(&invocation, &ws.config, &StubEngine::new(json!({}))).unwrap_err();
        assert!(matches!(err, PipelineError::Report(_)));
    }
}
