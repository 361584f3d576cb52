//! # laneway-core
//!
//! Core types, traits, and placement algorithms for the laneway positioning
//! engine.
//!
//! This crate provides the foundational pieces the other laneway crates
//! depend on:
//!
//! - The domain model: boards, queues, items, change records, notifications
//! - Dense-position placement math, shared by every ledger executor so the
//!   PostgreSQL and in-memory backends cannot drift apart
//! - The notification targeting policy
//! - Store contracts implemented by `laneway-db` and `laneway-engine`
//! - Broadcast event payloads delivered to board subscribers

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod positioning;
pub mod targeting;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::BoardEvent;
pub use models::*;
pub use positioning::{
    insertion_slot, relocation_slot, ChangePlan, ItemPatch, NewComment, NewItem, PlannedChange,
    RecordDraft,
};
pub use targeting::recipients;
pub use traits::*;
pub use uuid_utils::{extract_timestamp, is_v7, new_v7};
