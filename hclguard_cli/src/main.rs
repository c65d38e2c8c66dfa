//! # hclguard
//!

use clap::Parser;
use hclguard_cli::args::Cli;
use hclguard_core::logging::{self, codes, FacadeLogger, LogLevel, LoggingService};
use std::sync::Arc;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let level = if verbose {
        LogLevel::Debug
    } else {
        logging::config::get_min_log_level()
    };
    let service = LoggingService::new(Arc::new(FacadeLogger), level);
    if let Err(e) = logging::init_global_logging_with_service(Arc::new(service)) {
        logging::safe_log_error(codes::system::INITIALIZATION_FAILED, &e);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdout = std::io::stdout();
    let code = match hclguard_cli::run(&cli, &mut stdout.lock()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error[{}]: {}", e.error_code().as_str(), e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}
