use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config_pv::{ConfigPv, ConfigPvDefinition};

pub type NodeId = i64;

/// Id of the single root folder, seeded by the initial migration
pub const ROOT_NODE_ID: NodeId = 1;

/// Discriminator of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Folder,
    Configuration,
}

impl NodeKind {
    /// Value stored in the `node.kind` column
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Folder => "FOLDER",
            NodeKind::Configuration => "CONFIGURATION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FOLDER" => Some(NodeKind::Folder),
            "CONFIGURATION" => Some(NodeKind::Configuration),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Folder => f.write_str("folder"),
            NodeKind::Configuration => f.write_str("configuration"),
        }
    }
}

/// An entry in the save/restore namespace, regardless of kind
///
/// Kind-specific payloads are resolved through [`Folder`] and
/// [`Configuration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// `None` only for the root folder
    pub parent_id: Option<NodeId>,
    pub kind: NodeKind,
    pub last_modified: DateTime<Utc>,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.id == ROOT_NODE_ID
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn is_configuration(&self) -> bool {
        self.kind == NodeKind::Configuration
    }
}

/// A folder node together with its direct children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(flatten)]
    pub node: Node,
    /// Ordered by kind, then name
    pub children: Vec<Node>,
}

/// A configuration node with its resolved, ordered PV list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(flatten)]
    pub node: Node,
    pub description: String,
    pub system: Option<String>,
    pub active: bool,
    pub pvs: Vec<ConfigPv>,
}

impl Configuration {
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }
}

/// Input for creating a configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewConfiguration {
    pub name: String,
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pvs: Vec<ConfigPvDefinition>,
}

/// Replacement values for an existing configuration
///
/// The PV list replaces the current one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationUpdate {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pvs: Vec<ConfigPvDefinition>,
}
