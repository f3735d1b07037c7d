//! Folder commands

use clap::{Args, Subcommand};
use saverestore_core::errors::ExError;
use saverestore_core::model::{NodeId, ROOT_NODE_ID};
use saverestore_engine::EngineCommand;

use super::session::{print_json, Session};

#[derive(Debug, Args)]
pub struct FolderArgs {
    #[command(subcommand)]
    pub command: FolderCommand,
}

#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// Create a folder
    Create {
        #[arg(long)]
        name: String,
        /// Parent folder id
        #[arg(long, default_value_t = ROOT_NODE_ID)]
        parent: NodeId,
    },
}

pub async fn execute(args: FolderArgs, session: &mut Session) -> Result<(), ExError> {
    let cmd = match args.command {
        FolderCommand::Create { name, parent } => EngineCommand::CreateFolder {
            name,
            parent_id: Some(parent),
        },
    };
    print_json(&session.run(cmd).await?)
}
