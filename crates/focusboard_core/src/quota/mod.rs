//! Visibility quota and unlock engine.
//!
//! # Responsibility
//! - Bound the number of simultaneously visible pending tasks.
//! - Rank hidden tasks so the most time-critical work unlocks first.
//! - Hold the deferred single-task unlock requested after a completion.
//!
//! # Invariants
//! - Visible/hidden partitions are derived on demand, never cached.
//! - Only pending tasks take part in either partition.
//! - Lowering the quota never hides tasks that are already shown.

pub mod limit;
pub mod schedule;
pub mod unlock;
