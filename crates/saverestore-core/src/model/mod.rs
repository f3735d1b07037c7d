pub mod config_pv;
pub mod node;
pub mod snapshot;

pub use config_pv::{ConfigPv, ConfigPvDefinition, ConfigPvId};
pub use node::{
    Configuration, ConfigurationUpdate, Folder, NewConfiguration, Node, NodeId, NodeKind,
    ROOT_NODE_ID,
};
pub use snapshot::{FetchStatus, Snapshot, SnapshotId, SnapshotPv, SnapshotState};
