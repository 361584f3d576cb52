//! # laneway-engine
//!
//! The concurrency core of laneway: everything that makes simultaneous
//! edits of one board safe.
//!
//! - [`LockRegistry`]: per-queue FIFO serialization domains
//! - [`Coordinator`]: the submit pipeline — lock, plan, commit atomically,
//!   publish
//! - [`BoardRouter`]: board-scoped realtime fan-out with best-effort
//!   per-connection delivery
//! - [`MemoryStore`]: an in-memory implementation of the store contracts,
//!   backing the property tests and embedded deployments
//!
//! The engine is storage-agnostic: it coordinates against the
//! `laneway-core` store traits, so the same pipeline drives PostgreSQL in
//! production and the memory store in tests.

pub mod coordinator;
pub mod locks;
pub mod memory;
pub mod router;

pub use coordinator::Coordinator;
pub use locks::LockRegistry;
pub use memory::MemoryStore;
pub use router::BoardRouter;
