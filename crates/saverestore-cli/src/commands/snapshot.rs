//! Snapshot commands

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Subcommand};
use saverestore_core::errors::ExError;
use saverestore_core::model::{NodeId, SnapshotId};
use saverestore_core::pv_source::StaticPvSource;
use saverestore_engine::EngineCommand;

use super::session::{print_json, Session};

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Read a configuration's PVs and store a preliminary snapshot
    Take {
        config_id: NodeId,
        /// JSON table of PV readings keyed by PV name
        #[arg(long)]
        pv_values: Option<PathBuf>,
    },
    /// Commit a preliminary snapshot
    Commit {
        id: SnapshotId,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Show a committed snapshot
    Show {
        id: SnapshotId,
        /// Omit the stored PV values
        #[arg(long)]
        no_values: bool,
    },
    /// List the committed snapshots of a configuration
    List { config_id: NodeId },
    /// Delete a snapshot
    Delete { id: SnapshotId },
}

pub async fn execute(args: SnapshotArgs, session: &mut Session) -> Result<(), ExError> {
    let result = match args.command {
        SnapshotCommand::Take {
            config_id,
            pv_values,
        } => {
            let source = match pv_values {
                Some(path) => StaticPvSource::from_json_file(&path)?,
                None => StaticPvSource::new(),
            };
            tracing::debug!(known_pvs = source.len(), "loaded PV values");
            session
                .run_with_source(EngineCommand::TakeSnapshot { config_id }, Arc::new(source))
                .await?
        }
        SnapshotCommand::Commit { id, user, comment } => {
            session
                .run(EngineCommand::CommitSnapshot {
                    snapshot_id: id,
                    user_name: user,
                    comment,
                })
                .await?
        }
        SnapshotCommand::Show { id, no_values } => {
            session
                .run(EngineCommand::GetSnapshot {
                    snapshot_id: id,
                    include_values: !no_values,
                })
                .await?
        }
        SnapshotCommand::List { config_id } => {
            session.run(EngineCommand::GetSnapshots { config_id }).await?
        }
        SnapshotCommand::Delete { id } => {
            session.run(EngineCommand::DeleteSnapshot { snapshot_id: id }).await?
        }
    };
    print_json(&result)
}
