//! Logging conventions for laneway.
//!
//! This module defines the shared vocabulary for structured log fields so
//! events from the engine, the database layer, and the API correlate
//! cleanly. The constants are the documented schema; call sites pass the
//! names as literal `tracing` fields.
//!
//! ─────────────────────────────────────────────────────────────────────────
//! Level contract
//! ─────────────────────────────────────────────────────────────────────────
//!
//! | Level | Meaning                                              |
//! |-------|------------------------------------------------------|
//! | ERROR | A mutation or request failed and the caller saw it   |
//! | WARN  | Degraded but serving: slow commits, dropped events,  |
//! |       | reindex repairs that found damage                    |
//! | INFO  | Lifecycle: startup, shutdown, connections, commits   |
//! | DEBUG | Per-operation detail: lock waits, planning decisions |
//! | TRACE | Hot-path detail, disabled in production              |
//!
//! ─────────────────────────────────────────────────────────────────────────
//! Field rules
//! ─────────────────────────────────────────────────────────────────────────
//!
//! - Every event names its `subsystem` (engine / db / api / router) and,
//!   where it helps, a `component` within it.
//! - `op` is the operation name, lowercase snake_case; for mutations it is
//!   [`crate::models::Mutation::name`].
//! - Durations are integral milliseconds under `duration_ms`.
//! - IDs are logged bare (no quotes, no prefixes) under the `*_id` names
//!   below.

/// Subsystem that emitted the event: "engine", "db", "api", or "router".
pub const SUBSYSTEM: &str = "subsystem";

/// Component within the subsystem (for example "pool" or "coordinator").
pub const COMPONENT: &str = "component";

/// Operation name, lowercase snake_case.
pub const OPERATION: &str = "op";

/// Wall-clock duration of the operation in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Board scope of the event.
pub const BOARD_ID: &str = "board_id";

/// Queue scope of the event.
pub const QUEUE_ID: &str = "queue_id";

/// Item addressed by the event.
pub const ITEM_ID: &str = "item_id";

/// User performing the mutation.
pub const ACTOR_ID: &str = "actor_id";

/// Realtime subscriber connection.
pub const CONNECTION_ID: &str = "connection_id";

/// Per-board change sequence assigned at commit.
pub const SEQ: &str = "seq";

/// Number of results or affected rows.
pub const RESULT_COUNT: &str = "result_count";

/// Human-readable error message on failure paths.
pub const ERROR_MSG: &str = "error";
