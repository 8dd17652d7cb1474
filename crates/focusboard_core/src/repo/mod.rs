//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence contract for task registry snapshots.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - History and pending unlocks are session-local and never persisted.

pub mod state_repo;
