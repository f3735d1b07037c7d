//! Tree naming rules and input validation
//!
//! Pure predicates over already-loaded data. The store calls these inside the
//! transaction that performs the mutation, so the sibling set checked is the
//! one that will be written against.

use std::collections::HashSet;

use crate::errors::{Result, SaveRestoreError};
use crate::model::{ConfigPv, ConfigPvDefinition, Node, NodeId, NodeKind, SnapshotPv};

/// True iff some sibling has both the same name and the same kind
///
/// Callers exclude the candidate itself from `siblings` (rename checks the
/// node's current siblings, which include the node).
pub fn does_name_clash(name: &str, kind: NodeKind, siblings: &[Node]) -> bool {
    siblings.iter().any(|s| s.kind == kind && s.name == name)
}

/// Fails with `NameClash` when [`does_name_clash`] holds
///
/// # Errors
///
/// Returns `NameClash` naming the parent under which the clash occurs.
pub fn ensure_no_name_clash(
    name: &str,
    kind: NodeKind,
    parent_id: NodeId,
    siblings: &[Node],
) -> Result<()> {
    if does_name_clash(name, kind, siblings) {
        return Err(SaveRestoreError::NameClash {
            name: name.to_string(),
            kind: kind.to_string(),
            parent_id,
        });
    }
    Ok(())
}

/// Reject empty and whitespace-only names
///
/// # Errors
///
/// Returns `InvalidName` for a blank name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SaveRestoreError::InvalidName {
            reason: "name must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Unwrap a required parent id
///
/// # Errors
///
/// Returns `ParentNotSpecified` for `None`.
pub fn require_parent(parent_id: Option<NodeId>) -> Result<NodeId> {
    parent_id.ok_or(SaveRestoreError::ParentNotSpecified)
}

/// Every PV name is non-blank and appears at most once in the list
///
/// # Errors
///
/// Returns `MissingField` for a blank PV name, `DuplicatePv` for a repeat.
pub fn validate_pv_definitions(pvs: &[ConfigPvDefinition]) -> Result<()> {
    let mut seen = HashSet::with_capacity(pvs.len());
    for pv in pvs {
        if pv.pv_name.trim().is_empty() {
            return Err(SaveRestoreError::MissingField {
                field: "pv_name".to_string(),
            });
        }
        if !seen.insert(pv.pv_name.as_str()) {
            return Err(SaveRestoreError::DuplicatePv {
                pv_name: pv.pv_name.clone(),
            });
        }
    }
    Ok(())
}

/// Both commit fields must be present and non-blank
///
/// # Errors
///
/// Returns `MissingField` naming the first absent field.
pub fn validate_commit_fields<'a>(
    user_name: Option<&'a str>,
    comment: Option<&'a str>,
) -> Result<(&'a str, &'a str)> {
    let user_name = user_name
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| SaveRestoreError::MissingField {
            field: "user_name".to_string(),
        })?;
    let comment = comment
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| SaveRestoreError::MissingField {
            field: "comment".to_string(),
        })?;
    Ok((user_name, comment))
}

/// Captured rows must cover the configuration's current PV list exactly, in order
///
/// # Errors
///
/// Returns `SnapshotValuesStale` when a row is missing, extra or out of place.
pub fn ensure_values_match(
    config_id: NodeId,
    current: &[ConfigPv],
    values: &[SnapshotPv],
) -> Result<()> {
    let matches = current.len() == values.len()
        && current
            .iter()
            .zip(values)
            .all(|(pv, row)| pv.id == row.config_pv.id);
    if !matches {
        return Err(SaveRestoreError::SnapshotValuesStale { config_id });
    }
    Ok(())
}
