use saverestore_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using SaveRestoreError
pub type Result<T> = std::result::Result<T, SaveRestoreError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every error surfaced to a caller carries exactly one of these kinds. The
/// kind is what callers branch on; the message is for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// An id does not resolve, or resolves to a node of the wrong kind
    NotFound,
    /// Missing required field, name clash, or an immutability rule on the root
    InvalidArgument,
    /// A single PV could not be read (recorded inline during capture)
    ReadFailure,

    // Integration/IO
    Persistence,
    Serialization,
    Io,
    Timeout,
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidArgument => "ERR_INVALID_ARGUMENT",
            ExErrorKind::ReadFailure => "ERR_READ_FAILURE",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (node, configuration, snapshot or PV name)
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Fill in the operation name unless a lower layer already named it
    pub fn or_op(mut self, op: &str) -> Self {
        if self.op.is_none() {
            self.op = Some(op.to_string());
        }
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for tree, registry and snapshot rules
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveRestoreError {
    // ===== Lookup Errors =====
    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: i64 },

    /// The id exists but is not a folder
    #[error("Folder not found: {node_id}")]
    FolderNotFound { node_id: i64 },

    /// The id exists but is not a configuration
    #[error("Configuration not found: {node_id}")]
    ConfigurationNotFound { node_id: i64 },

    #[error("Snapshot not found: {snapshot_id}")]
    SnapshotNotFound { snapshot_id: i64 },

    // ===== Structural Errors =====
    #[error("Parent node is not specified")]
    ParentNotSpecified,

    /// A same-kind sibling already holds the name
    #[error("Name clash: a {kind} named '{name}' already exists under node {parent_id}")]
    NameClash {
        name: String,
        kind: String,
        parent_id: i64,
    },

    #[error("The root node cannot be {action}")]
    RootImmutable { action: String },

    #[error("Node {node_id} is a configuration and cannot hold child nodes")]
    ParentIsConfiguration { node_id: i64 },

    #[error("Cannot move node {node_id} into its own subtree (target {target_id})")]
    MoveIntoDescendant { node_id: i64, target_id: i64 },

    // ===== Validation Errors =====
    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Duplicate PV '{pv_name}' in configuration")]
    DuplicatePv { pv_name: String },

    // ===== Snapshot Lifecycle Errors =====
    #[error("Snapshot {snapshot_id} is already committed")]
    SnapshotAlreadyCommitted { snapshot_id: i64 },

    /// Captured rows do not line up with the configuration's current PV list
    #[error("Values do not match the PV list of configuration {config_id}")]
    SnapshotValuesStale { config_id: i64 },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<SaveRestoreError> for ExError {
    fn from(err: SaveRestoreError) -> Self {
        let message = err.to_string();
        match err {
            SaveRestoreError::NodeNotFound { node_id }
            | SaveRestoreError::FolderNotFound { node_id }
            | SaveRestoreError::ConfigurationNotFound { node_id } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_entity_id(node_id)
                    .with_message(message)
            }

            SaveRestoreError::SnapshotNotFound { snapshot_id } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_entity_id(snapshot_id)
                    .with_message(message)
            }

            SaveRestoreError::NameClash { parent_id, .. } => {
                ExError::new(ExErrorKind::InvalidArgument)
                    .with_entity_id(parent_id)
                    .with_message(message)
            }

            SaveRestoreError::ParentIsConfiguration { node_id }
            | SaveRestoreError::MoveIntoDescendant { node_id, .. } => {
                ExError::new(ExErrorKind::InvalidArgument)
                    .with_entity_id(node_id)
                    .with_message(message)
            }

            SaveRestoreError::SnapshotAlreadyCommitted { snapshot_id } => {
                ExError::new(ExErrorKind::InvalidArgument)
                    .with_entity_id(snapshot_id)
                    .with_message(message)
            }

            SaveRestoreError::SnapshotValuesStale { config_id } => {
                ExError::new(ExErrorKind::InvalidArgument)
                    .with_entity_id(config_id)
                    .with_message(message)
            }

            SaveRestoreError::ParentNotSpecified
            | SaveRestoreError::RootImmutable { .. }
            | SaveRestoreError::InvalidName { .. }
            | SaveRestoreError::MissingField { .. }
            | SaveRestoreError::DuplicatePv { .. } => {
                ExError::new(ExErrorKind::InvalidArgument).with_message(message)
            }

            SaveRestoreError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for SaveRestoreError {
    fn from(err: serde_json::Error) -> Self {
        SaveRestoreError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_unique() {
        let kinds = [
            ExErrorKind::NotFound,
            ExErrorKind::InvalidArgument,
            ExErrorKind::ReadFailure,
            ExErrorKind::Persistence,
            ExErrorKind::Serialization,
            ExErrorKind::Io,
            ExErrorKind::Timeout,
            ExErrorKind::Config,
            ExErrorKind::Internal,
        ];
        let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_or_op_keeps_inner_op() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("get_folder")
            .or_op("move_node");
        assert_eq!(err.op(), Some("get_folder"));

        let err = ExError::new(ExErrorKind::NotFound).or_op("move_node");
        assert_eq!(err.op(), Some("move_node"));
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err: ExError = SaveRestoreError::NodeNotFound { node_id: 7 }.into();
        let text = err.to_string();
        assert!(text.starts_with("[ERR_NOT_FOUND]"));
        assert!(text.contains("Node not found: 7"));
        assert!(text.contains("(entity_id: 7)"));
    }
}
