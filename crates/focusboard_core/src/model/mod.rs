//! Task-centric domain model.
//!
//! # Responsibility
//! - Define the records owned by the task registry (tasks, projects,
//!   categories, relations) and their create/patch inputs.
//!
//! # Invariants
//! - Every task and project is identified by a stable UUID.
//! - Tasks are removed by hard delete; there are no tombstones.

pub mod category;
pub mod project;
pub mod relation;
pub mod task;
