use pom2gradle::cli::commands::{CliArgs, Commands};
use pom2gradle::cli::handlers::{handle_convert, handle_migrate, handle_modules};
use pom2gradle::util::logging::{self, LoggingConfig, LOG_JSON_ENV, LOG_LEVEL_ENV};
use pom2gradle::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    logging::init_logging(logging_config_from_args(&args));

    debug!("pom2gradle v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Convert(convert_args) => handle_convert(convert_args),
        Commands::Modules(modules_args) => handle_modules(modules_args),
        Commands::Migrate(migrate_args) => handle_migrate(migrate_args, args.quiet).await,
    };

    std::process::exit(exit_code);
}

/// `--log-level` wins over `-v`/`-q`, which win over the environment
fn logging_config_from_args(args: &CliArgs) -> LoggingConfig {
    let level = if let Some(level_str) = &args.log_level {
        logging::parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
        logging::parse_level(&level_str)
    };

    let use_json = env::var(LOG_JSON_ENV)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    LoggingConfig {
        level,
        use_json,
        ..LoggingConfig::default()
    }
}
