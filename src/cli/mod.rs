pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, ConfigArgs, GenerateArgs, OutputFormatArg};
pub use handlers::{
    exit_code, handle_config, handle_generate, EXIT_CANCELLED, EXIT_COMPLETED, EXIT_FAILED,
};
pub use output::{OutputFormat, OutputFormatter, ReportExtras};
