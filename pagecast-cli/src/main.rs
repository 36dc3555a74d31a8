//! Pagecast CLI - read chapters in an external viewer

mod commands;
mod paths;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pagecast")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a chapter stored as a directory of images
    Read(ReadArgs),

    /// Show reading history
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct ReadArgs {
    /// Chapter directory
    pub input: PathBuf,

    /// Output format (cbz, zip, plain, pdf)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Reader program for the output format
    #[arg(short, long)]
    pub reader: Option<String>,

    /// Upscale every page before converting
    #[arg(long)]
    pub enhance: bool,

    /// Open the chapter URL in a browser instead (`--browser=PROGRAM` picks one)
    #[arg(
        long,
        value_name = "PROGRAM",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = ""
    )]
    pub browser: Option<String>,

    /// Do not record the chapter in the history
    #[arg(long)]
    pub no_history: bool,

    /// Always convert, even if a download exists
    #[arg(long)]
    pub fresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "pagecast=debug,pagecast_core=debug"
    } else {
        "pagecast=info,pagecast_core=warn"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let paths = paths::Paths::resolve(cli.config)?;

    match cli.command {
        Commands::Read(args) => commands::read(&paths, args).await,
        Commands::History { json } => commands::history(&paths, json).await,
        Commands::Config => commands::config(&paths),
    }
}
