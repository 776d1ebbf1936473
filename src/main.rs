use artigen::cli::commands::{CliArgs, Commands};
use artigen::cli::handlers::{handle_config, handle_generate};
use artigen::util::logging::{init_logging, parse_level, LoggingConfig};
use artigen::VERSION;

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("artigen v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Generate(generate_args) => handle_generate(generate_args, args.quiet).await,
        Commands::Config(config_args) => handle_config(config_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let mut config = LoggingConfig::from_env();
    if let Some(level) = &args.log_level {
        config.level = parse_level(level);
    } else if args.verbose {
        config.level = Level::DEBUG;
    } else if args.quiet {
        config.level = Level::ERROR;
    }
    init_logging(config);
}
