//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical between the engine's boundary
//! logging, the store's debug events and the test capture layer.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Entity identifiers
pub const FIELD_NODE_ID: &str = "node_id";
pub const FIELD_CONFIG_ID: &str = "config_id";
pub const FIELD_SNAPSHOT_ID: &str = "snapshot_id";
pub const FIELD_PV_NAME: &str = "pv_name";

// Snapshot capture counters
pub const FIELD_PV_COUNT: &str = "pv_count";
pub const FIELD_FAILED_COUNT: &str = "failed_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
