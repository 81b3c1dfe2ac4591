use clap::Parser;
use repro_cli::Commands;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repro")]
#[command(about = "Reproduce research code in an isolated environment", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the XDG config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    repro_utils::tracing::init(cli.verbose).map_err(|e| eyre::eyre!(e))?;

    // `run` handles Ctrl-C itself so the partial report is still written
    let code = cli.command.execute(cli.config.as_deref()).await?;

    std::process::exit(code);
}
