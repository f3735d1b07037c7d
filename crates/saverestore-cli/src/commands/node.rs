//! Commands that apply to folders and configurations alike

use clap::{Args, Subcommand};
use saverestore_core::errors::ExError;
use saverestore_core::model::NodeId;
use saverestore_engine::EngineCommand;

use super::session::{print_json, Session};

#[derive(Debug, Args)]
pub struct NodeArgs {
    #[command(subcommand)]
    pub command: NodeCommand,
}

#[derive(Debug, Subcommand)]
pub enum NodeCommand {
    /// Show a node, or its children with `--children`
    Show {
        id: NodeId,
        #[arg(long)]
        children: bool,
    },
    /// Rename a node in place
    Rename {
        id: NodeId,
        #[arg(long)]
        name: String,
    },
    /// Move a node under another folder
    Move {
        id: NodeId,
        #[arg(long)]
        to: NodeId,
    },
    /// Delete a node and everything beneath it
    Delete { id: NodeId },
}

pub async fn execute(args: NodeArgs, session: &mut Session) -> Result<(), ExError> {
    let cmd = match args.command {
        NodeCommand::Show {
            id,
            children: false,
        } => EngineCommand::GetNode { id },
        NodeCommand::Show { id, children: true } => EngineCommand::GetChildNodes { id },
        NodeCommand::Rename { id, name } => EngineCommand::RenameNode { id, new_name: name },
        NodeCommand::Move { id, to } => EngineCommand::MoveNode {
            id,
            target_parent_id: to,
        },
        NodeCommand::Delete { id } => EngineCommand::DeleteNode { id },
    };
    print_json(&session.run(cmd).await?)
}
