//! Consumer-facing command surface
//!
//! Every operation a front end can invoke is one [`EngineCommand`] variant.
//! [`apply_engine_command`] owns boundary logging:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Errors leave here stamped with the operation name and the caller's
//! request/trace ids.

use std::time::Instant;

use rusqlite::Connection;
use saverestore_core::errors::ExError;
use saverestore_core::model::{
    Configuration, ConfigurationUpdate, Folder, NewConfiguration, Node, NodeId, Snapshot,
    SnapshotId, SnapshotPv,
};
use saverestore_core::{log_op_end, log_op_error, log_op_start};
use saverestore_core_types::RequestContext;
use saverestore_store::errors::Result;
use saverestore_store::{NodeStore, SnapshotStore};
use serde::Serialize;

use crate::commands::take_snapshot::SnapshotOrchestrator;

#[derive(Debug, Clone)]
pub enum EngineCommand {
    CreateFolder {
        name: String,
        parent_id: Option<NodeId>,
    },
    CreateConfiguration(NewConfiguration),
    UpdateConfiguration(ConfigurationUpdate),
    GetNode {
        id: NodeId,
    },
    GetFolder {
        id: NodeId,
    },
    GetChildNodes {
        id: NodeId,
    },
    GetConfiguration {
        id: NodeId,
    },
    GetConfigurations,
    RenameNode {
        id: NodeId,
        new_name: String,
    },
    MoveNode {
        id: NodeId,
        target_parent_id: NodeId,
    },
    DeleteNode {
        id: NodeId,
    },
    TakeSnapshot {
        config_id: NodeId,
    },
    CommitSnapshot {
        snapshot_id: SnapshotId,
        user_name: Option<String>,
        comment: Option<String>,
    },
    GetSnapshot {
        snapshot_id: SnapshotId,
        include_values: bool,
    },
    GetSnapshots {
        config_id: NodeId,
    },
    GetSnapshotPvValues {
        snapshot_id: SnapshotId,
    },
    DeleteSnapshot {
        snapshot_id: SnapshotId,
    },
}

impl EngineCommand {
    /// Operation name used in logs and errors
    pub fn op_name(&self) -> &'static str {
        match self {
            EngineCommand::CreateFolder { .. } => "create_folder",
            EngineCommand::CreateConfiguration(_) => "create_configuration",
            EngineCommand::UpdateConfiguration(_) => "update_configuration",
            EngineCommand::GetNode { .. } => "get_node",
            EngineCommand::GetFolder { .. } => "get_folder",
            EngineCommand::GetChildNodes { .. } => "get_child_nodes",
            EngineCommand::GetConfiguration { .. } => "get_configuration",
            EngineCommand::GetConfigurations => "get_configurations",
            EngineCommand::RenameNode { .. } => "rename_node",
            EngineCommand::MoveNode { .. } => "move_node",
            EngineCommand::DeleteNode { .. } => "delete_node",
            EngineCommand::TakeSnapshot { .. } => "take_snapshot",
            EngineCommand::CommitSnapshot { .. } => "commit_snapshot",
            EngineCommand::GetSnapshot { .. } => "get_snapshot",
            EngineCommand::GetSnapshots { .. } => "get_snapshots",
            EngineCommand::GetSnapshotPvValues { .. } => "get_snapshot_pv_values",
            EngineCommand::DeleteSnapshot { .. } => "delete_snapshot",
        }
    }
}

/// Result of applying an engine command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EngineCommandResult {
    Node(Node),
    Nodes(Vec<Node>),
    Folder(Folder),
    Configuration(Configuration),
    Configurations(Vec<Configuration>),
    Snapshot(Snapshot),
    /// `None` while the snapshot is preliminary
    MaybeSnapshot(Option<Snapshot>),
    Snapshots(Vec<Snapshot>),
    SnapshotPvValues(Vec<SnapshotPv>),
    Deleted,
}

/// Apply one command under the caller's request context
pub async fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
    orchestrator: &SnapshotOrchestrator,
    ctx: &RequestContext,
) -> Result<EngineCommandResult> {
    let op = cmd.op_name();
    log_op_start!(op, request_id = ctx.request_id.as_str());
    let start = Instant::now();

    let result = dispatch(cmd, conn, orchestrator).await.map_err(|e| {
        let e = with_context(e.or_op(op), ctx);
        log_op_error!(
            op,
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        e
    })?;

    log_op_end!(
        op,
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str()
    );
    Ok(result)
}

fn with_context(err: ExError, ctx: &RequestContext) -> ExError {
    let err = err.with_request_id(ctx.request_id.clone());
    match &ctx.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}

async fn dispatch(
    cmd: EngineCommand,
    conn: &mut Connection,
    orchestrator: &SnapshotOrchestrator,
) -> Result<EngineCommandResult> {
    use EngineCommandResult as R;

    match cmd {
        EngineCommand::CreateFolder { name, parent_id } => {
            NodeStore::create_folder(conn, &name, parent_id).map(R::Folder)
        }
        EngineCommand::CreateConfiguration(new) => {
            NodeStore::create_configuration(conn, &new).map(R::Configuration)
        }
        EngineCommand::UpdateConfiguration(update) => {
            NodeStore::update_configuration(conn, &update).map(R::Configuration)
        }
        EngineCommand::GetNode { id } => NodeStore::get_node(conn, id).map(R::Node),
        EngineCommand::GetFolder { id } => NodeStore::get_folder(conn, id).map(R::Folder),
        EngineCommand::GetChildNodes { id } => NodeStore::get_child_nodes(conn, id).map(R::Nodes),
        EngineCommand::GetConfiguration { id } => {
            NodeStore::get_configuration(conn, id).map(R::Configuration)
        }
        EngineCommand::GetConfigurations => {
            NodeStore::list_configurations(conn).map(R::Configurations)
        }
        EngineCommand::RenameNode { id, new_name } => {
            NodeStore::rename_node(conn, id, &new_name).map(R::Node)
        }
        EngineCommand::MoveNode {
            id,
            target_parent_id,
        } => NodeStore::move_node(conn, id, target_parent_id).map(R::Node),
        EngineCommand::DeleteNode { id } => NodeStore::delete_node(conn, id).map(|_| R::Deleted),
        EngineCommand::TakeSnapshot { config_id } => orchestrator
            .take_snapshot(conn, config_id)
            .await
            .map(R::Snapshot),
        EngineCommand::CommitSnapshot {
            snapshot_id,
            user_name,
            comment,
        } => SnapshotStore::commit(conn, snapshot_id, user_name.as_deref(), comment.as_deref())
            .map(R::Snapshot),
        EngineCommand::GetSnapshot {
            snapshot_id,
            include_values,
        } => SnapshotStore::get_snapshot(conn, snapshot_id, include_values).map(R::MaybeSnapshot),
        EngineCommand::GetSnapshots { config_id } => {
            SnapshotStore::list_snapshots(conn, config_id).map(R::Snapshots)
        }
        EngineCommand::GetSnapshotPvValues { snapshot_id } => {
            SnapshotStore::get_snapshot_pv_values(conn, snapshot_id).map(R::SnapshotPvValues)
        }
        EngineCommand::DeleteSnapshot { snapshot_id } => {
            SnapshotStore::delete_snapshot(conn, snapshot_id).map(|_| R::Deleted)
        }
    }
}
