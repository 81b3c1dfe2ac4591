use clap::{Args, Subcommand};
use repro_config::{Settings, SettingsLoader};
use repro_core::Result;
use std::path::{Path, PathBuf};

pub mod cache;
pub mod diagnose;
pub mod run;

use self::cache::CacheCommands;

#[derive(Subcommand)]
pub enum Commands {
    /// Reproduce a paper's code
    Run(RunArgs),

    /// Inspect or clear the result cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Diagnose error output from a file, or stdin with '-'
    Diagnose {
        /// File containing the error text
        input: String,

        /// Emit the diagnosis as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Paper metadata JSON file
    pub paper: PathBuf,

    /// Repository candidates JSON file; defaults to the paper's GitHub URLs
    #[arg(long)]
    pub candidates: Option<PathBuf>,

    /// Repository analysis JSON file; defaults to scanning the clone
    #[arg(long)]
    pub analysis: Option<PathBuf>,

    /// Command to run instead of the detected entry point
    #[arg(long)]
    pub command: Option<String>,

    /// Execution timeout in minutes
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Environment strategy (auto, docker, conda, venv, node)
    #[arg(short = 'e', long = "env")]
    pub environment: Option<String>,

    /// Choose the repository interactively
    #[arg(short, long)]
    pub interactive: bool,

    /// Bypass the result cache
    #[arg(long)]
    pub no_cache: bool,

    /// Data directory mounted into container runs
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl Commands {
    /// Run the command and return the process exit code
    pub async fn execute(self, config: Option<&Path>) -> Result<i32> {
        match self {
            Commands::Run(args) => run::execute(load_settings(config)?, args).await,
            Commands::Cache { command } => command.execute(&load_settings(config)?),
            Commands::Diagnose { input, json } => diagnose::execute(&input, json),
        }
    }
}

fn load_settings(config: Option<&Path>) -> Result<Settings> {
    let loader = SettingsLoader::new();
    match config {
        Some(path) => loader.file(path).load(),
        None => loader.load(),
    }
}
