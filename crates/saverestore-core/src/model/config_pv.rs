use serde::{Deserialize, Serialize};

pub type ConfigPvId = i64;

/// A PV reference as supplied by a caller, before registry resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPvDefinition {
    pub pv_name: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub readonly: bool,
}

impl ConfigPvDefinition {
    pub fn new(pv_name: impl Into<String>) -> Self {
        Self {
            pv_name: pv_name.into(),
            ..Self::default()
        }
    }
}

/// A deduplicated PV definition shared by every configuration naming the PV
///
/// `pv_name` is the registry key; the remaining fields are whatever the first
/// configuration to reference the PV supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPv {
    pub id: ConfigPvId,
    pub pv_name: String,
    pub group_name: Option<String>,
    pub tags: Option<String>,
    pub readonly: bool,
}
