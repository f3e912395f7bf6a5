use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spanr")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Converge a system with script-backed resources", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty configuration project layout
    Init(InitArgs),

    /// List gatherers, resources and config items of a project
    #[command(alias = "ls")]
    List(ListArgs),

    /// Apply (or with --test, check) a configuration
    Run(RunArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct InitArgs {
    /// Project directory (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Overwrite existing template files without asking
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Project directory
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Alternative manifest file
    #[arg(short, long, env = "SPANR_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Project directory
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Properties file (flat YAML map) exported to every script
    #[arg(short, long, env = "SPANR_PROPERTIES")]
    pub properties: Option<PathBuf>,

    /// Only run tests; do not change the system
    #[arg(short, long)]
    pub test: bool,

    /// Alternative manifest file
    #[arg(short, long, env = "SPANR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the annotated manifest here (YAML, or JSON for *.json)
    #[arg(short, long, env = "SPANR_OUTPUT")]
    pub output: Option<PathBuf>,
}
