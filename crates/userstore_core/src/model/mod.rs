//! Domain model for the user roster.
//!
//! # Responsibility
//! - Define the record shape shared by store, persistence and UI layers.
//! - Define the immutable store snapshot and its default seed.
//! - Provide collision-free record id generation.
//!
//! # Invariants
//! - Every record is identified by a `RecordId` unique within one snapshot.
//! - Snapshots are never mutated after construction; changes build new ones.

pub mod id;
pub mod record;
pub mod state;
