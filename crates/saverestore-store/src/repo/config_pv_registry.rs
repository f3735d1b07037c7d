//! Shared PV definitions
//!
//! A `config_pv` row is keyed by PV name and shared by every configuration
//! that lists the PV. Usage is not stored as a counter; it is the number of
//! `config_pv_relation` rows plus stored `snapshot_pv` rows pointing at the
//! definition, so it can never drift from the data.

use crate::errors::{from_rusqlite, Result};
use crate::repo::hydration::{config_pv_from_row, CONFIG_PV_COLUMNS};
use rusqlite::{params, Connection, OptionalExtension};
use saverestore_core::model::{ConfigPv, ConfigPvDefinition, ConfigPvId, NodeId};

pub struct ConfigPvRegistry;

impl ConfigPvRegistry {
    /// Return the definition registered under `def.pv_name`, creating it if absent
    ///
    /// An existing definition is returned unchanged: group, tags and the
    /// read-only flag are whatever the first registration supplied.
    pub fn resolve(conn: &Connection, def: &ConfigPvDefinition) -> Result<ConfigPv> {
        if let Some(existing) = Self::find_by_name(conn, &def.pv_name)? {
            return Ok(existing);
        }

        conn.execute(
            "INSERT INTO config_pv (pv_name, group_name, tags, readonly) VALUES (?1, ?2, ?3, ?4)",
            params![def.pv_name, def.group_name, def.tags, def.readonly],
        )
        .map_err(from_rusqlite)?;

        tracing::debug!(pv_name = %def.pv_name, "registered config pv");
        Ok(ConfigPv {
            id: conn.last_insert_rowid(),
            pv_name: def.pv_name.clone(),
            group_name: def.group_name.clone(),
            tags: def.tags.clone(),
            readonly: def.readonly,
        })
    }

    /// Delete the definition if nothing references it any more
    ///
    /// Returns whether the definition was removed. Callers drop their own
    /// reference first.
    pub fn release(conn: &Connection, config_pv_id: ConfigPvId) -> Result<bool> {
        if Self::usage(conn, config_pv_id)? > 0 {
            return Ok(false);
        }
        let removed = conn
            .execute("DELETE FROM config_pv WHERE id = ?1", [config_pv_id])
            .map_err(from_rusqlite)?;
        if removed > 0 {
            tracing::debug!(config_pv_id, "removed orphaned config pv");
        }
        Ok(removed > 0)
    }

    /// Configurations plus stored snapshot values referencing the definition
    pub fn usage(conn: &Connection, config_pv_id: ConfigPvId) -> Result<i64> {
        conn.query_row(
            "SELECT (SELECT COUNT(*) FROM config_pv_relation WHERE config_pv_id = ?1)
                  + (SELECT COUNT(*) FROM snapshot_pv WHERE config_pv_id = ?1)",
            [config_pv_id],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)
    }

    pub fn find_by_name(conn: &Connection, pv_name: &str) -> Result<Option<ConfigPv>> {
        conn.query_row(
            &format!("SELECT {} FROM config_pv WHERE pv_name = ?1", CONFIG_PV_COLUMNS),
            [pv_name],
            config_pv_from_row,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// The PV list of a configuration, in configuration order
    pub fn list_for_configuration(conn: &Connection, config_id: NodeId) -> Result<Vec<ConfigPv>> {
        let mut stmt = conn
            .prepare(
                "SELECT cp.id, cp.pv_name, cp.group_name, cp.tags, cp.readonly
                 FROM config_pv cp
                 JOIN config_pv_relation r ON r.config_pv_id = cp.id
                 WHERE r.config_id = ?1
                 ORDER BY r.position",
            )
            .map_err(from_rusqlite)?;
        let pvs = stmt
            .query_map([config_id], config_pv_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(pvs)
    }

    /// Point a configuration at the given definitions, resolving each one
    ///
    /// Replaces any existing list. Returns the ids that were referenced
    /// before and are no longer; the caller releases them.
    pub fn attach(
        conn: &Connection,
        config_id: NodeId,
        defs: &[ConfigPvDefinition],
    ) -> Result<Vec<ConfigPvId>> {
        let previous: Vec<ConfigPvId> = Self::list_for_configuration(conn, config_id)?
            .into_iter()
            .map(|pv| pv.id)
            .collect();

        conn.execute(
            "DELETE FROM config_pv_relation WHERE config_id = ?1",
            [config_id],
        )
        .map_err(from_rusqlite)?;

        let mut current = Vec::with_capacity(defs.len());
        for (position, def) in defs.iter().enumerate() {
            let pv = Self::resolve(conn, def)?;
            conn.execute(
                "INSERT INTO config_pv_relation (config_id, config_pv_id, position)
                 VALUES (?1, ?2, ?3)",
                params![config_id, pv.id, position as i64],
            )
            .map_err(from_rusqlite)?;
            current.push(pv.id);
        }

        Ok(previous
            .into_iter()
            .filter(|id| !current.contains(id))
            .collect())
    }
}
