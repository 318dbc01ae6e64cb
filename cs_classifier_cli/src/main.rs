//! # csclassify

use clap::Parser;
use cs_classifier::logging::{self, LoggingService};
use cs_classifier::{log_info, pipeline};
use cs_classifier_cli::bridge::LogBridge;
use cs_classifier_cli::{run, Cli};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .format_timestamp(None)
        .init();

    let service = LoggingService::new(Arc::new(LogBridge), LogBridge::min_level(&cli.log_level));
    if let Err(e) = logging::init_global_logging_with_service(Arc::new(service)) {
        eprintln!("error: logging initialization failed: {}", e);
        return ExitCode::from(2);
    }
    if let Err(e) = pipeline::validate_pipeline() {
        eprintln!("error: {}", e);
        return ExitCode::from(2);
    }
    log_info!("csclassify starting", "inputs" => cli.paths.len());

    let stdout = std::io::stdout();
    match run(&cli, &mut stdout.lock()) {
        Ok(summary) if summary.failures == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
