//! Command-line front end.
//!
//! Owns everything before file resolution: argument count, output path
//! coercion, presence of the specification file and the data directory. It
//! also maps every run onto the process exit code.

use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::ValidatorConfig;
use crate::engine::ValidationEngine;
use crate::logs::{log_error, log_warning};
use crate::pipeline::{validate_package, Invocation, Stage, EXIT_FAILURE, EXIT_SUCCESS};
use crate::reporter::{ErrorRecord, ErrorType, ResultEnvelope};

/// Usage line written on argument errors.
pub const USAGE: &str = "Usage: csv-validate <spec_path> <data_dir> <output_path>";

#[derive(Parser, Debug)]
#[command(name = "csv-validate")]
#[command(version, about = "Validate CSV extracts against an IG-derived specification", long_about = None)]
pub struct Cli {
    /// Specification JSON (resources and their table schemas)
    pub spec_path: PathBuf,

    /// Directory holding the CSV files
    pub data_dir: PathBuf,

    /// Where to write the JSON result (must end in .json)
    pub output_path: String,

    /// Diagnostic verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Turn a clap failure into an exit code.
///
/// Help and version requests print and succeed. Anything else is a wrong
/// invocation: an `argument-error` envelope goes to the default output.
pub fn handle_parse_error(error: clap::Error, config: &ValidatorConfig) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            if let Err(e) = error.print() {
                tracing::warn!(error = %e, "failed to print help");
            }
            EXIT_SUCCESS
        }
        kind => {
            tracing::debug!(?kind, error = %error, "invalid arguments");
            log_error(USAGE);
            let envelope = ResultEnvelope::single(ErrorRecord::new(ErrorType::ArgumentError, USAGE));
            write_or_report(&envelope, &config.default_output);
            EXIT_FAILURE
        }
    }
}

/// Keep `raw` when it names a JSON file, else fall back to the default output.
pub fn coerce_output_path(raw: &str, config: &ValidatorConfig) -> PathBuf {
    if raw.ends_with(".json") {
        return PathBuf::from(raw);
    }

    log_warning(format!(
        "Warning: Provided output path '{}' is not a valid JSON file. Defaulting to '{}'.",
        raw,
        config.default_output.display()
    ));
    config.default_output.clone()
}

/// Run a parsed invocation to completion and return the exit code.
pub fn dispatch(cli: &Cli, config: &ValidatorConfig, engine: &dyn ValidationEngine) -> i32 {
    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id);
    let _guard = span.enter();
    tracing::debug!(stage = ?Stage::Init, "starting run");

    let output_path = coerce_output_path(&cli.output_path, config);

    if !cli.spec_path.is_file() {
        return fail_early(
            ErrorType::FileMissingError,
            format!("Error: Specification file '{}' not found.", cli.spec_path.display()),
            &output_path,
        );
    }

    if !cli.data_dir.is_dir() {
        return fail_early(
            ErrorType::DirectoryMissingError,
            format!("Error: Data directory '{}' not found.", cli.data_dir.display()),
            &output_path,
        );
    }
    tracing::debug!(stage = ?Stage::ArgsValidated, "arguments validated");

    let invocation = Invocation {
        spec_path: cli.spec_path.clone(),
        data_dir: cli.data_dir.clone(),
        output_path,
    };

    match validate_package(&invocation, config, engine) {
        Ok(outcome) => {
            tracing::debug!(stage = ?outcome.stage, "run finished");
            EXIT_SUCCESS
        }
        Err(e) => fail_early(
            ErrorType::ValidationError,
            format!("Error during validation: {}", e),
            &invocation.output_path,
        ),
    }
}

/// Parse `args` and run. Used by `main` and by tests.
pub fn run<I, T>(args: I, config: &ValidatorConfig, engine: &dyn ValidationEngine) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => dispatch(&cli, config, engine),
        Err(e) => handle_parse_error(e, config),
    }
}

fn fail_early(error_type: ErrorType, message: String, output: &Path) -> i32 {
    tracing::debug!(stage = ?Stage::Faulted, %message, "run aborted");
    log_error(&message);
    let envelope = ResultEnvelope::single(ErrorRecord::new(error_type, message));
    write_or_report(&envelope, output);
    EXIT_FAILURE
}

fn write_or_report(envelope: &ResultEnvelope, output: &Path) {
    if let Err(e) = envelope.write(output) {
        tracing::error!(error = %e, "could not write result envelope");
        log_error(e.to_string());
    }
}
