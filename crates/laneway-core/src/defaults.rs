//! Centralized default constants for laneway.
//!
//! Every tunable that more than one crate touches lives here, so the server,
//! the engine, and the tests agree on one value. Environment variables may
//! override the server-level ones at startup; the engine-level ones are
//! compile-time.

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for activity feeds.
pub const ACTIVITY_PAGE_LIMIT: i64 = 50;

/// Hard cap for activity feed page size, regardless of what the client asks
/// for.
pub const ACTIVITY_PAGE_LIMIT_MAX: i64 = 200;

/// Default page size for notification listings.
pub const NOTIFICATION_PAGE_LIMIT: i64 = 50;

/// Hard cap for notification listing page size.
pub const NOTIFICATION_PAGE_LIMIT_MAX: i64 = 200;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Maximum accepted request body, in bytes. Mutations are small JSON
/// documents; anything near this limit is a client bug.
pub const REQUEST_BODY_LIMIT_BYTES: usize = 262_144;

/// Interval between WebSocket keepalive pings, in seconds.
pub const WS_PING_INTERVAL_SECS: u64 = 30;

// =============================================================================
// ENGINE
// =============================================================================

/// Depth of each subscriber's event queue. A subscriber that falls this far
/// behind starts losing the NEWEST events for its boards; the durable
/// change history is the catch-up path.
pub const CONNECTION_QUEUE_DEPTH: usize = 64;

/// How many times an item-addressed mutation re-resolves the owning queue
/// after losing a race with a concurrent move. Each retry implies another
/// committed move of the same item in the gap between resolution and lock
/// acquisition; exhausting the budget is reported as an internal error.
pub const OWNER_RESOLVE_RETRIES: usize = 16;
