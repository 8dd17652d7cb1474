//! In-memory task registry.
//!
//! # Responsibility
//! - Own the canonical ordered task list, projects, custom categories and
//!   the quota setting.
//! - Expose raw insert/remove/replace primitives used by commands and by
//!   history replay.
//!
//! # Invariants
//! - Task ids are unique within the list.
//! - Project deletion clears task references and never deletes tasks.

pub mod task_registry;
