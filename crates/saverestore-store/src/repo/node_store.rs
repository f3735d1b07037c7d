//! Node tree store
//!
//! Folders and configurations live in one `node` table; configuration
//! details and their PV lists hang off it by node id.
//!
//! Every mutation runs in one `IMMEDIATE` transaction: validation, the
//! structural change and the `last_modified` propagation see and write the
//! same state, and either all land or none do. `last_modified` only moves
//! forward: a touch stores `MAX(now, previous + 1)` milliseconds.

use crate::db::{self, now_ms};
use crate::errors::{from_rusqlite, Result};
use crate::repo::config_pv_registry::ConfigPvRegistry;
use crate::repo::hydration::{node_from_row, NODE_COLUMNS};
use rusqlite::{params, Connection, OptionalExtension};
use saverestore_core::errors::{ExError, SaveRestoreError};
use saverestore_core::model::{
    ConfigPvId, Configuration, ConfigurationUpdate, Folder, NewConfiguration, Node, NodeId,
    NodeKind, ROOT_NODE_ID,
};
use saverestore_core::rules;

/// All node ids in the subtree rooted at `?1`, the root first
const SUBTREE_CTE: &str = "WITH RECURSIVE subtree(id, depth) AS (
        SELECT ?1, 0
        UNION ALL
        SELECT n.id, s.depth + 1 FROM node n JOIN subtree s ON n.parent_id = s.id
    )";

fn domain_err(op: &str, err: SaveRestoreError) -> ExError {
    ExError::from(err).with_op(op)
}

pub struct NodeStore;

impl NodeStore {
    // ===== Reads =====

    /// Any node, regardless of kind
    pub fn get_node(conn: &Connection, id: NodeId) -> Result<Node> {
        Self::find_node(conn, id)?
            .ok_or_else(|| domain_err("get_node", SaveRestoreError::NodeNotFound { node_id: id }))
    }

    pub fn find_node(conn: &Connection, id: NodeId) -> Result<Option<Node>> {
        conn.query_row(
            &format!("SELECT {} FROM node WHERE id = ?1", NODE_COLUMNS),
            [id],
            node_from_row,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// A folder with its direct children
    ///
    /// A configuration id is reported as not found.
    pub fn get_folder(conn: &Connection, id: NodeId) -> Result<Folder> {
        let node = Self::find_node(conn, id)?
            .filter(Node::is_folder)
            .ok_or_else(|| {
                domain_err("get_folder", SaveRestoreError::FolderNotFound { node_id: id })
            })?;
        let children = Self::children(conn, id)?;
        Ok(Folder { node, children })
    }

    /// Direct children of a folder, ordered by kind then name
    pub fn get_child_nodes(conn: &Connection, id: NodeId) -> Result<Vec<Node>> {
        Self::get_folder(conn, id)
            .map(|folder| folder.children)
            .map_err(|e| e.or_op("get_child_nodes"))
    }

    /// A configuration with its resolved PV list
    ///
    /// A folder id is reported as not found.
    pub fn get_configuration(conn: &Connection, id: NodeId) -> Result<Configuration> {
        let node = Self::find_node(conn, id)?
            .filter(Node::is_configuration)
            .ok_or_else(|| {
                domain_err(
                    "get_configuration",
                    SaveRestoreError::ConfigurationNotFound { node_id: id },
                )
            })?;
        Self::hydrate_configuration(conn, node)
    }

    /// Every configuration in the tree, ordered by id
    pub fn list_configurations(conn: &Connection) -> Result<Vec<Configuration>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM node WHERE kind = ?1 ORDER BY id",
                NODE_COLUMNS
            ))
            .map_err(from_rusqlite)?;
        let nodes = stmt
            .query_map([NodeKind::Configuration.as_str()], node_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        nodes
            .into_iter()
            .map(|node| Self::hydrate_configuration(conn, node))
            .collect()
    }

    fn hydrate_configuration(conn: &Connection, node: Node) -> Result<Configuration> {
        let (description, system, active): (String, Option<String>, bool) = conn
            .query_row(
                "SELECT description, system, active FROM config WHERE node_id = ?1",
                [node.id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(from_rusqlite)?;
        let pvs = ConfigPvRegistry::list_for_configuration(conn, node.id)?;
        Ok(Configuration {
            node,
            description,
            system,
            active,
            pvs,
        })
    }

    fn children(conn: &Connection, parent_id: NodeId) -> Result<Vec<Node>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM node WHERE parent_id = ?1 ORDER BY kind, name",
                NODE_COLUMNS
            ))
            .map_err(from_rusqlite)?;
        let nodes = stmt
            .query_map([parent_id], node_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(nodes)
    }

    /// Ids in the subtree rooted at `id` (inclusive), parents before children
    pub fn subtree_ids(conn: &Connection, id: NodeId) -> Result<Vec<NodeId>> {
        let mut stmt = conn
            .prepare(&format!(
                "{} SELECT id FROM subtree ORDER BY depth, id",
                SUBTREE_CTE
            ))
            .map_err(from_rusqlite)?;
        let ids = stmt
            .query_map([id], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<NodeId>, _>>()
            .map_err(from_rusqlite)?;
        Ok(ids)
    }

    // ===== Mutations =====

    /// Create a folder under `parent_id`
    pub fn create_folder(
        conn: &mut Connection,
        name: &str,
        parent_id: Option<NodeId>,
    ) -> Result<Folder> {
        const OP: &str = "create_folder";
        rules::validate_name(name).map_err(|e| domain_err(OP, e))?;

        let tx = db::immediate(conn)?;
        let parent = Self::resolve_parent(&tx, parent_id, OP)?;
        Self::ensure_free(&tx, name, NodeKind::Folder, parent.id, None, OP)?;

        let id = Self::insert_node(&tx, name, parent.id, NodeKind::Folder)?;
        Self::touch(&tx, parent.id)?;
        let folder = Self::get_folder(&tx, id)?;
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(node_id = id, parent_id = parent.id, "created folder");
        Ok(folder)
    }

    /// Create a configuration, resolving its PVs through the registry
    pub fn create_configuration(
        conn: &mut Connection,
        new: &NewConfiguration,
    ) -> Result<Configuration> {
        const OP: &str = "create_configuration";
        rules::validate_name(&new.name).map_err(|e| domain_err(OP, e))?;
        rules::validate_pv_definitions(&new.pvs).map_err(|e| domain_err(OP, e))?;

        let tx = db::immediate(conn)?;
        let parent = Self::resolve_parent(&tx, new.parent_id, OP)?;
        Self::ensure_free(&tx, &new.name, NodeKind::Configuration, parent.id, None, OP)?;

        let id = Self::insert_node(&tx, &new.name, parent.id, NodeKind::Configuration)?;
        tx.execute(
            "INSERT INTO config (node_id, description, system, active) VALUES (?1, ?2, ?3, ?4)",
            params![id, new.description, new.system, new.active],
        )
        .map_err(from_rusqlite)?;
        ConfigPvRegistry::attach(&tx, id, &new.pvs)?;
        Self::touch(&tx, parent.id)?;

        let config = Self::get_configuration(&tx, id)?;
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(
            node_id = id,
            parent_id = parent.id,
            pv_count = config.pvs.len(),
            "created configuration"
        );
        Ok(config)
    }

    /// Rename a node; only the node's own timestamp moves
    pub fn rename_node(conn: &mut Connection, id: NodeId, new_name: &str) -> Result<Node> {
        const OP: &str = "rename_node";
        if id == ROOT_NODE_ID {
            return Err(domain_err(
                OP,
                SaveRestoreError::RootImmutable {
                    action: "renamed".to_string(),
                },
            ));
        }
        rules::validate_name(new_name).map_err(|e| domain_err(OP, e))?;

        let tx = db::immediate(conn)?;
        let node = Self::get_node(&tx, id).map_err(|e| e.with_op(OP))?;
        if let Some(parent_id) = node.parent_id {
            Self::ensure_free(&tx, new_name, node.kind, parent_id, Some(id), OP)?;
        }

        tx.execute(
            "UPDATE node SET name = ?1 WHERE id = ?2",
            params![new_name, id],
        )
        .map_err(from_rusqlite)?;
        Self::touch(&tx, id)?;

        let renamed = Self::get_node(&tx, id)?;
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(node_id = id, "renamed node");
        Ok(renamed)
    }

    /// Reparent a node under a folder; both parents are touched
    pub fn move_node(
        conn: &mut Connection,
        source_id: NodeId,
        target_parent_id: NodeId,
    ) -> Result<Node> {
        const OP: &str = "move_node";
        let tx = db::immediate(conn)?;

        let source = Self::get_node(&tx, source_id).map_err(|e| e.with_op(OP))?;
        let target = Self::get_node(&tx, target_parent_id).map_err(|e| e.with_op(OP))?;

        let Some(old_parent_id) = source.parent_id else {
            return Err(domain_err(
                OP,
                SaveRestoreError::RootImmutable {
                    action: "moved".to_string(),
                },
            ));
        };
        if target.is_configuration() {
            return Err(domain_err(
                OP,
                SaveRestoreError::ParentIsConfiguration { node_id: target.id },
            ));
        }
        if Self::subtree_ids(&tx, source.id)?.contains(&target.id) {
            return Err(domain_err(
                OP,
                SaveRestoreError::MoveIntoDescendant {
                    node_id: source.id,
                    target_id: target.id,
                },
            ));
        }
        Self::ensure_free(&tx, &source.name, source.kind, target.id, Some(source.id), OP)?;

        tx.execute(
            "UPDATE node SET parent_id = ?1 WHERE id = ?2",
            params![target.id, source.id],
        )
        .map_err(from_rusqlite)?;
        Self::touch(&tx, old_parent_id)?;
        if target.id != old_parent_id {
            Self::touch(&tx, target.id)?;
        }

        let moved = Self::get_node(&tx, source.id)?;
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(
            node_id = source.id,
            from = old_parent_id,
            to = target.id,
            "moved node"
        );
        Ok(moved)
    }

    /// Delete a node and its whole subtree
    ///
    /// Deleting the root is a no-op. Snapshots of deleted configurations go
    /// with them; PV definitions left without any reference are removed.
    pub fn delete_node(conn: &mut Connection, id: NodeId) -> Result<()> {
        const OP: &str = "delete_node";
        if id == ROOT_NODE_ID {
            tracing::debug!("ignoring delete of root folder");
            return Ok(());
        }

        let tx = db::immediate(conn)?;
        let node = Self::get_node(&tx, id).map_err(|e| e.with_op(OP))?;

        let referenced = Self::referenced_config_pvs(&tx, id)?;
        let subtree = Self::subtree_ids(&tx, id)?;
        for node_id in subtree.iter().rev() {
            Self::delete_single(&tx, *node_id)?;
        }
        let mut released = 0;
        for config_pv_id in referenced {
            if ConfigPvRegistry::release(&tx, config_pv_id)? {
                released += 1;
            }
        }
        if let Some(parent_id) = node.parent_id {
            Self::touch(&tx, parent_id)?;
        }
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(
            node_id = id,
            deleted = subtree.len(),
            released_pvs = released,
            "deleted subtree"
        );
        Ok(())
    }

    /// Replace name, details and PV list of an existing configuration
    pub fn update_configuration(
        conn: &mut Connection,
        update: &ConfigurationUpdate,
    ) -> Result<Configuration> {
        const OP: &str = "update_configuration";
        rules::validate_name(&update.name).map_err(|e| domain_err(OP, e))?;
        rules::validate_pv_definitions(&update.pvs).map_err(|e| domain_err(OP, e))?;

        let tx = db::immediate(conn)?;
        let current = Self::get_configuration(&tx, update.id).map_err(|e| e.with_op(OP))?;

        if current.node.name != update.name {
            if let Some(parent_id) = current.node.parent_id {
                Self::ensure_free(
                    &tx,
                    &update.name,
                    NodeKind::Configuration,
                    parent_id,
                    Some(update.id),
                    OP,
                )?;
            }
            tx.execute(
                "UPDATE node SET name = ?1 WHERE id = ?2",
                params![update.name, update.id],
            )
            .map_err(from_rusqlite)?;
        }

        tx.execute(
            "UPDATE config SET description = ?1, system = ?2, active = ?3 WHERE node_id = ?4",
            params![update.description, update.system, update.active, update.id],
        )
        .map_err(from_rusqlite)?;

        let dropped = ConfigPvRegistry::attach(&tx, update.id, &update.pvs)?;
        for config_pv_id in dropped {
            ConfigPvRegistry::release(&tx, config_pv_id)?;
        }
        Self::touch(&tx, update.id)?;

        let config = Self::get_configuration(&tx, update.id)?;
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(node_id = update.id, pv_count = config.pvs.len(), "updated configuration");
        Ok(config)
    }

    // ===== Helpers =====

    /// The parent must be given, must exist and must be a folder
    fn resolve_parent(conn: &Connection, parent_id: Option<NodeId>, op: &str) -> Result<Node> {
        let parent_id = rules::require_parent(parent_id).map_err(|e| domain_err(op, e))?;
        let parent = Self::get_node(conn, parent_id).map_err(|e| e.with_op(op))?;
        if parent.is_configuration() {
            return Err(domain_err(
                op,
                SaveRestoreError::ParentIsConfiguration { node_id: parent.id },
            ));
        }
        Ok(parent)
    }

    /// Fail if a same-kind child of `parent_id` other than `except` holds `name`
    fn ensure_free(
        conn: &Connection,
        name: &str,
        kind: NodeKind,
        parent_id: NodeId,
        except: Option<NodeId>,
        op: &str,
    ) -> Result<()> {
        let siblings: Vec<Node> = Self::children(conn, parent_id)?
            .into_iter()
            .filter(|n| Some(n.id) != except)
            .collect();
        rules::ensure_no_name_clash(name, kind, parent_id, &siblings)
            .map_err(|e| domain_err(op, e))
    }

    fn insert_node(
        conn: &Connection,
        name: &str,
        parent_id: NodeId,
        kind: NodeKind,
    ) -> Result<NodeId> {
        conn.execute(
            "INSERT INTO node (name, parent_id, kind, last_modified) VALUES (?1, ?2, ?3, ?4)",
            params![name, parent_id, kind.as_str(), now_ms()],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    fn touch(conn: &Connection, id: NodeId) -> Result<()> {
        conn.execute(
            "UPDATE node SET last_modified = MAX(?1, last_modified + 1) WHERE id = ?2",
            params![now_ms(), id],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    /// PV definitions used by configurations in the subtree or their snapshots
    fn referenced_config_pvs(conn: &Connection, id: NodeId) -> Result<Vec<ConfigPvId>> {
        let mut stmt = conn
            .prepare(&format!(
                "{} SELECT config_pv_id FROM config_pv_relation
                     WHERE config_id IN (SELECT id FROM subtree)
                   UNION
                   SELECT sp.config_pv_id FROM snapshot_pv sp
                     JOIN snapshot s ON s.id = sp.snapshot_id
                     WHERE s.config_id IN (SELECT id FROM subtree)",
                SUBTREE_CTE
            ))
            .map_err(from_rusqlite)?;
        let ids = stmt
            .query_map([id], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<ConfigPvId>, _>>()
            .map_err(from_rusqlite)?;
        Ok(ids)
    }

    /// Remove one node and everything keyed by it; children must already be gone
    fn delete_single(conn: &Connection, id: NodeId) -> Result<()> {
        conn.execute(
            "DELETE FROM snapshot_pv WHERE snapshot_id IN
                (SELECT id FROM snapshot WHERE config_id = ?1)",
            [id],
        )
        .map_err(from_rusqlite)?;
        conn.execute("DELETE FROM snapshot WHERE config_id = ?1", [id])
            .map_err(from_rusqlite)?;
        conn.execute("DELETE FROM config_pv_relation WHERE config_id = ?1", [id])
            .map_err(from_rusqlite)?;
        conn.execute("DELETE FROM config WHERE node_id = ?1", [id])
            .map_err(from_rusqlite)?;
        conn.execute("DELETE FROM node WHERE id = ?1", [id])
            .map_err(from_rusqlite)?;
        Ok(())
    }
}
