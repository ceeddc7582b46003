//! Runs the hospital analysis on `Hospital_General_Information.xlsx` in the
//! working directory.
//!
//! Exit status: 0 when everything was computed, 1 on a fatal error, 2 when a
//! statistical test could not be computed.

use std::process::ExitCode;

use hospital_eda::config::AnalysisConfig;
use hospital_eda::logging::{init_logging, LoggingConfig};
use hospital_eda::pipeline;

const EXIT_FATAL: u8 = 1;
const EXIT_TEST_FAILED: u8 = 2;

fn main() -> ExitCode {
    if let Err(e) = init_logging(LoggingConfig::default()) {
        eprintln!("warning: logging disabled: {e}");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let config = AnalysisConfig::default();
    match runtime.block_on(pipeline::run(&config)) {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_TEST_FAILED),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
