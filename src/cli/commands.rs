use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Artifact tree and multi-phase code generation driver
#[derive(Parser, Debug)]
#[command(
    name = "artigen",
    about = "Artifact tree and multi-phase code generation driver",
    version,
    author,
    long_about = "artigen loads a data schema and a declarative generation manifest, runs the \
                  solution, project, file and placeholder phases against an in-memory store \
                  and reports what was generated."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Enable debug logging"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run a generation pass for one layer and scope",
        long_about = "Builds a workspace with a layer and scope artifact, installs the manifest \
                      generator and runs every generation phase for the schema.\n\n\
                      Examples:\n  \
                      artigen generate schema.json --manifest artigen.toml\n  \
                      artigen generate schema.json -m artigen.toml --layer Web --scope Billing\n  \
                      artigen generate schema.json -m artigen.toml --format json --tree"
    )]
    Generate(GenerateArgs),

    #[command(
        about = "Show the effective configuration",
        long_about = "Prints the configuration resolved from ARTIGEN_* environment variables."
    )]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(value_name = "SCHEMA", help = "Path to the JSON schema")]
    pub schema: PathBuf,

    #[arg(
        short = 'm',
        long,
        value_name = "FILE",
        help = "Path to the TOML generation manifest"
    )]
    pub manifest: PathBuf,

    #[arg(long, value_name = "LAYER", default_value = "Domain", help = "Layer to generate")]
    pub layer: String,

    #[arg(long, value_name = "SCOPE", default_value = "Shared", help = "Scope to generate")]
    pub scope: String,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, help = "Print the artifact tree after the run")]
    pub tree: bool,

    #[arg(long, help = "Print the content of every generated file")]
    pub show_content: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
