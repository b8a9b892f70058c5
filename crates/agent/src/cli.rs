use clap::{Parser, Subcommand, ValueEnum};
use infrastructure::config::{LogFormat, LogLevel};
use infrastructure::constants::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(
    name = "aliastables",
    about = "Resolve packet-filter aliases into address tables",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "ALIASTABLES_CONFIG")]
    pub config: String,

    /// Log level override (takes precedence over config file)
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log format: text or json
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Table,
    /// JSON document
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display version and build information
    Version,

    /// Resolve aliases and write their tables (default: all aliases)
    Resolve {
        /// Re-resolve even when inputs are unchanged and not expired
        #[arg(short, long)]
        force: bool,

        /// Alias names to resolve
        aliases: Vec<String>,
    },

    /// Print the stored table of one alias
    Show {
        /// Alias name
        alias: String,
    },

    /// List references between aliases
    Deps,
}

/// Parse CLI arguments.
pub fn parse() -> Cli {
    Cli::parse()
}
