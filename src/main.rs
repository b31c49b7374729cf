use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::EnvFilter;

use artman::commands::{fetch, init, map, pack, scan};

#[derive(Parser)]
#[command(name = "artman")]
#[command(about = "Artifact tool manager for offline forensic collectors", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new artman project
    Init(init::Args),

    /// Scan artifact definitions and report the tools they reference
    Scan(scan::Args),

    /// Download referenced tool binaries into the local cache
    Fetch(fetch::Args),

    /// Assemble an offline collector package from artifacts and cached tools
    Pack(pack::Args),

    /// Export the artifact-to-tool mapping as a table or JSON
    Map(map::Args),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init::run(args),
        Commands::Scan(args) => scan::run(args),
        Commands::Fetch(args) => {
            let (root, config) = artman::dirs::load_config()?;
            fetch::run(args, &root, &config)
        }
        Commands::Pack(args) => {
            let (root, config) = artman::dirs::load_config()?;
            pack::run(args, &root, &config)
        }
        Commands::Map(args) => {
            let (root, config) = artman::dirs::load_config()?;
            map::run(args, &root, &config)
        }
    }
}
