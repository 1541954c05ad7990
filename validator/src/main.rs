//! csv-validate CLI
//!
//! ```bash
//! csv-validate spec.json ./data result.json        # validate ./data, write result.json
//! csv-validate -vv spec.json ./data result.json    # same, with debug diagnostics on stderr
//! ```
//!
//! Environment (a `.env` file is honoured):
//!
//! - `CSV_VALIDATE_LIMIT_ERRORS` - per-resource error cap of the engine
//! - `CSV_VALIDATE_LOG_FORMAT` - `compact` (default) or `json`
//! - `RUST_LOG` - overrides the `-v` level

use clap::Parser;
use csv_validate::cli::{dispatch, handle_parse_error, Cli};
use csv_validate::logs::{init_tracing, LoggingConfig};
use csv_validate::{TableSchemaEngine, ValidatorConfig};

fn main() {
    dotenvy::dotenv().ok();

    let code = match Cli::try_parse() {
        Ok(cli) => {
            let logging = LoggingConfig::from_verbosity(cli.verbose).merge_with_env();
            if let Err(e) = init_tracing(&logging) {
                eprintln!("Failed to initialize logging: {}", e);
            }

            let config = ValidatorConfig::from_env();
            let engine = TableSchemaEngine::new(config.limit_errors);
            dispatch(&cli, &config, &engine)
        }
        Err(e) => handle_parse_error(e, &ValidatorConfig::from_env()),
    };

    std::process::exit(code);
}
