//! Save/restore CLI
//!
//! Command-line front end for the PV save/restore archive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "saverestore")]
#[command(about = "PV save/restore archive", long_about = None)]
struct Cli {
    /// Settings file (TOML); `SAVERESTORE_*` variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding `database_path` from settings
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Folder operations
    Folder(commands::folder::FolderArgs),
    /// Configuration operations
    Config(commands::config::ConfigArgs),
    /// Operations on any node
    Node(commands::node::NodeArgs),
    /// Snapshot operations
    Snapshot(commands::snapshot::SnapshotArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match commands::session::Session::open(cli.config.as_deref(), cli.db) {
        Ok(mut session) => match cli.command {
            Commands::Folder(args) => commands::folder::execute(args, &mut session).await,
            Commands::Config(args) => commands::config::execute(args, &mut session).await,
            Commands::Node(args) => commands::node::execute(args, &mut session).await,
            Commands::Snapshot(args) => commands::snapshot::execute(args, &mut session).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
